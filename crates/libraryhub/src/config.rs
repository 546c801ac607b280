/// Backend connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// `name=value; ...` cookie string forwarded on every backend call
    pub cookie: Option<String>,
}

impl ApiConfig {
    /// Default backend address when `LIBRARYHUB_API_BASE_URL` is unset
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000/api";

    /// Load configuration from environment variables
    /// Uses LIBRARYHUB_API_BASE_URL with default fallback
    /// Uses LIBRARYHUB_COOKIE if set
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("LIBRARYHUB_API_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            cookie: std::env::var("LIBRARYHUB_COOKIE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, base_url: Option<String>, cookie: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(cookie) = cookie {
            self.cookie = Some(cookie);
        }
        self
    }
}
