pub mod json_store;
pub mod progression;
pub mod schema;
