//! Static client configuration.
//!
//! Fixed at construction; nothing here changes while requests are in flight.

use crate::error::QuoterError;

/// Repository used when an operation is called without an explicit one.
pub const DEFAULT_REPO: &str = "uadaf";

pub const URL_ENV: &str = "QUOTER_URL";
pub const ACCESS_KEY_ENV: &str = "QUOTER_ACCESS_KEY";
pub const REPO_ENV: &str = "QUOTER_REPO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoterConfig {
    pub base_url: String,
    pub access_key: Option<String>,
    pub default_repo: String,
}

impl QuoterConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_key: None,
            default_repo: DEFAULT_REPO.to_string(),
        }
    }

    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    pub fn with_default_repo(mut self, repo: impl Into<String>) -> Self {
        self.default_repo = repo.into();
        self
    }

    /// Read `QUOTER_URL` (required), `QUOTER_ACCESS_KEY` and `QUOTER_REPO`.
    pub fn from_env() -> Result<Self, QuoterError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, QuoterError> {
        let base_url = lookup(URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| QuoterError::Config(format!("{URL_ENV} is not set")))?;
        let mut config = Self::new(base_url);
        config.access_key = lookup(ACCESS_KEY_ENV).filter(|key| !key.is_empty());
        if let Some(repo) = lookup(REPO_ENV).filter(|repo| !repo.is_empty()) {
            config.default_repo = repo;
        }
        Ok(config)
    }
}
