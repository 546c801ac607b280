use crate::prelude::*;
use libraryhub_core::cookies::{join_cookie_pairs, parse_cookie_header};
use reqwest::cookie::Jar;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_FILE: &str = "cookies.json";

/// Backend cookies kept between CLI invocations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct CachedCookies {
    base_url: String,
    cookies: String,
    saved_at: String,
}

#[derive(Debug, Clone)]
pub struct CookieCache {
    path: PathBuf,
}

impl CookieCache {
    /// Cache under the user's cache directory, e.g. `~/.cache/libraryhub/`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs_next::cache_dir()
            .ok_or_else(|| eyre!("Unable to determine cache directory"))?
            .join("libraryhub");
        Ok(Self::in_dir(&dir))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(CACHE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cookies saved for `base_url`. Entries saved for another backend are ignored.
    pub fn load(&self, base_url: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .map_err(|e| eyre!("Failed to read cookie cache {}: {}", self.path.display(), e))?;
        let cached: CachedCookies = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                log::warn!("Ignoring unreadable cookie cache {}: {e}", self.path.display());
                return Ok(None);
            }
        };

        if cached.base_url != base_url || cached.cookies.trim().is_empty() {
            return Ok(None);
        }
        log::debug!("Loaded cookies saved at {}", cached.saved_at);
        Ok(Some(cached.cookies))
    }

    pub fn save(&self, base_url: &str, cookies: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
        }

        let cached = CachedCookies {
            base_url: base_url.to_string(),
            cookies: join_cookie_pairs(parse_cookie_header(cookies)),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&cached)?)
            .map_err(|e| eyre!("Failed to write cookie cache: {}", e))?;

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| eyre!("Failed to remove cookie cache: {}", e))?;
        }
        Ok(())
    }
}

/// Put every `name=value` pair of a cookie header into the jar for `url`.
pub fn restore_into(jar: &Jar, url: &Url, cookies: &str) {
    for (name, value) in parse_cookie_header(cookies) {
        jar.add_cookie_str(&format!("{name}={value}; Path=/"), url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    const BASE: &str = "http://localhost:3000/api";

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());

        cache.save(BASE, "SESSION=abc; XSRF-TOKEN=tok").unwrap();

        assert_eq!(
            cache.load(BASE).unwrap().as_deref(),
            Some("SESSION=abc; XSRF-TOKEN=tok")
        );
    }

    #[test]
    fn test_save_drops_malformed_segments() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());

        cache.save(BASE, " SESSION=abc ;; XSRF-TOKEN=tok; junk").unwrap();

        assert_eq!(
            cache.load(BASE).unwrap().as_deref(),
            Some("SESSION=abc; XSRF-TOKEN=tok")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(&dir.path().join("nested"));

        assert_eq!(cache.load(BASE).unwrap(), None);
    }

    #[test]
    fn test_load_ignores_other_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());
        cache.save("https://other.example.com/api", "SESSION=abc").unwrap();

        assert_eq!(cache.load(BASE).unwrap(), None);
    }

    #[test]
    fn test_load_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());
        fs::write(cache.path(), "not json").unwrap();

        assert_eq!(cache.load(BASE).unwrap(), None);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());
        cache.save(BASE, "SESSION=abc").unwrap();

        cache.clear().unwrap();
        cache.clear().unwrap();

        assert!(!cache.path().exists());
    }

    #[test]
    fn test_restore_into_jar() {
        let jar = Jar::default();
        let url = Url::parse(BASE).unwrap();

        restore_into(&jar, &url, "SESSION=abc; XSRF-TOKEN=tok");

        let header = jar.cookies(&url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("SESSION=abc"));
        assert!(header.contains("XSRF-TOKEN=tok"));
    }
}
