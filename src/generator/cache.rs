use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Last good body of each remote corpus, so a later offline start still gets it.
pub struct RemoteCache {
    dir: PathBuf,
}

impl RemoteCache {
    /// The `corpus/` folder of the player's data directory.
    pub fn in_data_dir(data_dir: &Path) -> Option<Self> {
        Self::at(data_dir.join("corpus")).ok()
    }

    pub fn at(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn load(&self, url: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(url)).ok()
    }

    /// Written to a temp file first so a crash never leaves half a corpus behind.
    pub fn store(&self, url: &str, body: &str) -> Result<()> {
        let path = self.entry_path(url);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let name: String = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[cfg(feature = "network")]
pub fn fetch(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let body = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("fetching {url}"))?
        .text()?;
    Ok(body)
}

#[cfg(not(feature = "network"))]
pub fn fetch(url: &str) -> Result<String> {
    anyhow::bail!("built without network support, cannot fetch {url}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = RemoteCache::at(dir.path().join("corpus")).unwrap();
        let url = "https://example.com/texts.json";
        assert!(cache.load(url).is_none());
        cache.store(url, "{}").unwrap();
        assert_eq!(cache.load(url).as_deref(), Some("{}"));
        assert!(cache.load("https://example.com/other.json").is_none());
    }

    #[test]
    fn test_entry_names_stay_inside_cache_dir() {
        let dir = TempDir::new().unwrap();
        let cache = RemoteCache::at(dir.path().to_path_buf()).unwrap();
        let path = cache.entry_path("https://host/../a/b?c=d");
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("host_.._a_b_c_d.json")
        );
    }
}
