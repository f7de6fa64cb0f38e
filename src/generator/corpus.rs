use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rust_embed::Embed;
use thiserror::Error;

use crate::generator::TextSource;
use crate::generator::cache::{RemoteCache, fetch};
use crate::session::tier::Tier;

#[derive(Embed)]
#[folder = "assets/corpus/"]
struct CorpusAssets;

const CORPUS_FILE: &str = "texts.json";

const FALLBACK_PRINCIPIANTE: &str = "La rana salta feliz entre las hojas verdes del lago. El sol brilla en el agua cristalina mientras los peces nadan.";
const FALLBACK_INTERMEDIO: &str = "La tecnolog\u{ed}a ha cambiado nuestras vidas de manera extraordinaria. Los tel\u{e9}fonos m\u{f3}viles nos conectan instant\u{e1}neamente con personas de todo el mundo.";
const FALLBACK_AVANZADO: &str = "La inteligencia artificial representa uno de los avances tecnol\u{f3}gicos m\u{e1}s significativos del siglo XXI. Su capacidad para procesar informaci\u{f3}n ha revolucionado industrias enteras.";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus is not a tier -> [text] JSON object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("required tier '{0}' is missing or has no non-empty text")]
    MissingTier(Tier),
    #[error("bundled corpus is missing or not UTF-8")]
    Bundled,
    #[error("remote corpus {0} unavailable and not cached")]
    Unavailable(String),
}

/// Where the active corpus came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorpusOrigin {
    File,
    Remote,
    Bundled,
    Fallback,
}

/// Candidate practice texts per tier. Every tier holds at least one non-empty text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextsData {
    principiante: Vec<String>,
    intermedio: Vec<String>,
    avanzado: Vec<String>,
}

impl TextsData {
    /// Parse a `{tier: [text, ...]}` object. Spanish keys and English aliases
    /// both count and are merged into the same pool; unknown keys are ignored.
    pub fn from_json(content: &str) -> Result<Self, CorpusError> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(content)?;
        let mut data = Self {
            principiante: Vec::new(),
            intermedio: Vec::new(),
            avanzado: Vec::new(),
        };
        for (key, texts) in raw {
            let Some(tier) = Tier::from_key(&key) else {
                continue;
            };
            data.texts_mut(tier).extend(
                texts
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            );
        }
        for &tier in Tier::all() {
            if data.texts(tier).is_empty() {
                return Err(CorpusError::MissingTier(tier));
            }
        }
        Ok(data)
    }

    pub fn fallback() -> Self {
        Self {
            principiante: vec![FALLBACK_PRINCIPIANTE.to_string()],
            intermedio: vec![FALLBACK_INTERMEDIO.to_string()],
            avanzado: vec![FALLBACK_AVANZADO.to_string()],
        }
    }

    pub fn bundled() -> Result<Self, CorpusError> {
        let file = CorpusAssets::get(CORPUS_FILE).ok_or(CorpusError::Bundled)?;
        let content = std::str::from_utf8(file.data.as_ref()).map_err(|_| CorpusError::Bundled)?;
        Self::from_json(content)
    }

    pub fn from_file(path: &Path) -> Result<Self, CorpusError> {
        let content = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn texts(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Principiante => &self.principiante,
            Tier::Intermedio => &self.intermedio,
            Tier::Avanzado => &self.avanzado,
        }
    }

    fn texts_mut(&mut self, tier: Tier) -> &mut Vec<String> {
        match tier {
            Tier::Principiante => &mut self.principiante,
            Tier::Intermedio => &mut self.intermedio,
            Tier::Avanzado => &mut self.avanzado,
        }
    }
}

fn load_remote(url: &str, data_dir: &Path) -> Result<TextsData, CorpusError> {
    let cache = RemoteCache::in_data_dir(data_dir);
    match fetch(url) {
        Ok(body) => match TextsData::from_json(&body) {
            Ok(data) => {
                if let Some(cache) = &cache
                    && let Err(e) = cache.store(url, &body)
                {
                    log::warn!("[CORPUS] could not cache remote corpus: {e:#}");
                }
                return Ok(data);
            }
            Err(e) => log::warn!("[CORPUS] remote corpus rejected: {e}"),
        },
        Err(e) => log::warn!("[CORPUS] {e:#}"),
    }
    let cached = cache
        .and_then(|c| c.load(url))
        .ok_or_else(|| CorpusError::Unavailable(url.to_string()))?;
    log::info!("[CORPUS] using cached copy of {url}");
    TextsData::from_json(&cached)
}

/// Walk the source layers in order; the hard-coded texts end the chain, so this never fails.
/// Remote corpora are cached under `data_dir`.
pub fn load_layered(
    path: Option<&Path>,
    url: Option<&str>,
    data_dir: &Path,
) -> (TextsData, CorpusOrigin) {
    if let Some(path) = path {
        match TextsData::from_file(path) {
            Ok(data) => return (data, CorpusOrigin::File),
            Err(e) => log::warn!("[CORPUS] {e}; trying next source"),
        }
    }
    if let Some(url) = url {
        match load_remote(url, data_dir) {
            Ok(data) => return (data, CorpusOrigin::Remote),
            Err(e) => log::warn!("[CORPUS] {e}; trying next source"),
        }
    }
    match TextsData::bundled() {
        Ok(data) => (data, CorpusOrigin::Bundled),
        Err(e) => {
            log::warn!("[CORPUS] {e}; using built-in fallback texts");
            (TextsData::fallback(), CorpusOrigin::Fallback)
        }
    }
}

enum ProviderState {
    Loading(mpsc::Receiver<(TextsData, CorpusOrigin)>),
    Ready {
        data: TextsData,
        origin: CorpusOrigin,
    },
}

/// Hands out a uniformly random practice text for a tier.
pub struct TextProvider {
    state: ProviderState,
    rng: SmallRng,
}

impl TextProvider {
    pub fn new(data: TextsData, origin: CorpusOrigin, rng: SmallRng) -> Self {
        Self {
            state: ProviderState::Ready { data, origin },
            rng,
        }
    }

    pub fn fallback() -> Self {
        Self::new(
            TextsData::fallback(),
            CorpusOrigin::Fallback,
            SmallRng::from_entropy(),
        )
    }

    /// Load synchronously on the calling thread.
    pub fn load(path: Option<&Path>, url: Option<&str>, data_dir: &Path) -> Self {
        let (data, origin) = load_layered(path, url, data_dir);
        log::info!("[CORPUS] loaded from {origin:?}");
        Self::new(data, origin, SmallRng::from_entropy())
    }

    /// Load on a background thread. Not ready until `poll` sees the result.
    pub fn spawn_load(path: Option<PathBuf>, url: Option<String>, data_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let loaded = load_layered(path.as_deref(), url.as_deref(), &data_dir);
            let _ = tx.send(loaded);
        });
        Self {
            state: ProviderState::Loading(rx),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Adopt a finished background load. Returns whether the provider is ready.
    pub fn poll(&mut self) -> bool {
        let next = match &self.state {
            ProviderState::Ready { .. } => return true,
            ProviderState::Loading(rx) => match rx.try_recv() {
                Ok(loaded) => loaded,
                Err(mpsc::TryRecvError::Empty) => return false,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("[CORPUS] loader thread vanished; using built-in fallback texts");
                    (TextsData::fallback(), CorpusOrigin::Fallback)
                }
            },
        };
        log::info!("[CORPUS] loaded from {:?}", next.1);
        self.state = ProviderState::Ready {
            data: next.0,
            origin: next.1,
        };
        true
    }

    pub fn origin(&self) -> Option<CorpusOrigin> {
        match &self.state {
            ProviderState::Ready { origin, .. } => Some(*origin),
            ProviderState::Loading(_) => None,
        }
    }
}

impl TextSource for TextProvider {
    fn is_ready(&mut self) -> bool {
        self.poll()
    }

    fn random_text(&mut self, tier: Tier) -> String {
        match &self.state {
            ProviderState::Ready { data, .. } => data
                .texts(tier)
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(|| TextsData::fallback().texts(tier)[0].clone()),
            ProviderState::Loading(_) => TextsData::fallback().texts(tier)[0].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[test]
    fn test_bundled_corpus_has_every_tier() {
        let data = TextsData::bundled().unwrap();
        for &tier in Tier::all() {
            assert!(!data.texts(tier).is_empty());
        }
    }

    #[test]
    fn test_english_aliases_merge_into_pool() {
        let json = r#"{
            "principiante": ["uno"],
            "beginner": ["two"],
            "intermediate": ["tres"],
            "avanzado": ["cuatro", "  "]
        }"#;
        let data = TextsData::from_json(json).unwrap();
        assert_eq!(data.texts(Tier::Principiante).len(), 2);
        assert_eq!(data.texts(Tier::Intermedio), ["tres".to_string()]);
        assert_eq!(data.texts(Tier::Avanzado), ["cuatro".to_string()]);
    }

    #[test]
    fn test_missing_tier_is_rejected() {
        let json = r#"{"principiante": ["a"], "intermedio": ["b"], "avanzado": []}"#;
        assert!(matches!(
            TextsData::from_json(json),
            Err(CorpusError::MissingTier(Tier::Avanzado))
        ));
    }

    #[test]
    fn test_unreadable_file_falls_through_to_bundled() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let (data, origin) = load_layered(Some(&missing), None, dir.path());
        assert_eq!(origin, CorpusOrigin::Bundled);
        assert!(!data.texts(Tier::Avanzado).is_empty());
    }

    #[test]
    fn test_corrupt_file_falls_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("texts.json");
        fs::write(&path, "{ not json").unwrap();
        let (_, origin) = load_layered(Some(&path), None, dir.path());
        assert_eq!(origin, CorpusOrigin::Bundled);
    }

    #[test]
    fn test_valid_file_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("texts.json");
        fs::write(
            &path,
            r#"{"principiante": ["abc"], "intermedio": ["def"], "avanzado": ["ghi"]}"#,
        )
        .unwrap();
        let mut provider = TextProvider::load(Some(&path), None, dir.path());
        assert_eq!(provider.origin(), Some(CorpusOrigin::File));
        assert_eq!(provider.random_text(Tier::Intermedio), "def");
    }

    #[test]
    fn test_unreachable_url_uses_cache_in_data_dir() {
        let dir = TempDir::new().unwrap();
        let url = "http://127.0.0.1:9/texts.json";
        RemoteCache::in_data_dir(dir.path())
            .unwrap()
            .store(
                url,
                r#"{"principiante": ["uno"], "intermedio": ["dos"], "avanzado": ["tres"]}"#,
            )
            .unwrap();

        let (data, origin) = load_layered(None, Some(url), dir.path());
        assert_eq!(origin, CorpusOrigin::Remote);
        assert_eq!(data.texts(Tier::Intermedio), ["dos".to_string()]);

        let elsewhere = TempDir::new().unwrap();
        let (_, origin) = load_layered(None, Some(url), elsewhere.path());
        assert_eq!(origin, CorpusOrigin::Bundled);
    }

    #[test]
    fn test_random_text_comes_from_tier_pool() {
        let mut provider = TextProvider::new(
            TextsData::bundled().unwrap(),
            CorpusOrigin::Bundled,
            SmallRng::seed_from_u64(7),
        );
        let pool = TextsData::bundled().unwrap();
        for _ in 0..20 {
            let text = provider.random_text(Tier::Avanzado);
            assert!(pool.texts(Tier::Avanzado).contains(&text));
        }
    }

    #[test]
    fn test_spawn_load_becomes_ready() {
        let dir = TempDir::new().unwrap();
        let mut provider = TextProvider::spawn_load(None, None, dir.path().to_path_buf());
        let deadline = Instant::now() + Duration::from_secs(5);
        while !provider.is_ready() {
            assert!(Instant::now() < deadline, "corpus never finished loading");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(provider.origin(), Some(CorpusOrigin::Bundled));
    }
}
