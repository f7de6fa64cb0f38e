pub mod cache;
pub mod corpus;

use crate::session::tier::Tier;

pub trait TextSource {
    /// False while the corpus is still being loaded.
    fn is_ready(&mut self) -> bool;
    fn random_text(&mut self, tier: Tier) -> String;
}
