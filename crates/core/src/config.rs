//! Portal configuration: where the backends live and how requests are authenticated.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables:
//!
//! ```toml
//! base_url = "https://office.move.mil"
//! csrf_cookie = "masked_gorilla_csrf"
//! csrf_header = "X-CSRF-Token"
//!
//! [spec_paths]
//! ghc = "/ghc/v1/swagger.yaml"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::surface::Surface;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_CSRF_COOKIE: &str = "masked_gorilla_csrf";
const DEFAULT_CSRF_HEADER: &str = "X-CSRF-Token";

/// Environment variable overriding [`PortalConfig::base_url`].
pub const BASE_URL_ENV: &str = "MOVEPORTAL_BASE_URL";
/// Environment variable overriding [`PortalConfig::csrf_cookie`].
pub const CSRF_COOKIE_ENV: &str = "MOVEPORTAL_CSRF_COOKIE";

/// Per-surface overrides of the Swagger document path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecPaths {
    /// Internal API document path.
    pub internal: Option<String>,
    /// Admin API document path.
    pub admin: Option<String>,
    /// GHC API document path.
    pub ghc: Option<String>,
    /// Prime API document path.
    pub prime: Option<String>,
}

/// Settings shared by every surface client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Origin (and optional path prefix) every spec and operation URL hangs off.
    pub base_url: String,
    /// Name of the anti-forgery cookie read before each request.
    pub csrf_cookie: String,
    /// Header the anti-forgery token is sent in.
    pub csrf_header: String,
    /// Spec path overrides.
    pub spec_paths: SpecPaths,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            spec_paths: SpecPaths::default(),
        }
    }
}

impl PortalConfig {
    /// Defaults with a different base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load a TOML config file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url;
        }
        if let Some(cookie) = lookup(CSRF_COOKIE_ENV).filter(|v| !v.trim().is_empty()) {
            self.csrf_cookie = cookie;
        }
    }

    /// Check that the base URL is absolute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|source| ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
                source,
            })
    }

    /// Swagger document path for a surface, honoring overrides.
    pub fn spec_path(&self, surface: Surface) -> &str {
        let path = match surface {
            Surface::Internal => self.spec_paths.internal.as_deref(),
            Surface::Admin => self.spec_paths.admin.as_deref(),
            Surface::Ghc => self.spec_paths.ghc.as_deref(),
            Surface::Prime => self.spec_paths.prime.as_deref(),
        };
        path.unwrap_or_else(|| surface.default_spec_path())
    }

    /// Absolute URL of a path below the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            Url::parse(&format!("{base}{path}"))
        } else {
            Url::parse(&format!("{base}/{path}"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.csrf_cookie, "masked_gorilla_csrf");
        assert_eq!(config.csrf_header, "X-CSRF-Token");
        assert_eq!(config.spec_path(Surface::Ghc), "/ghc/v1/swagger.yaml");
        config.validate().unwrap();
    }

    #[test]
    fn test_load_toml_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"https://office.example.com/\"\n\n[spec_paths]\nghc = \"/ghc/v2/swagger.yaml\""
        )
        .unwrap();

        let config = PortalConfig::load(file.path()).unwrap();
        assert_eq!(config.spec_path(Surface::Ghc), "/ghc/v2/swagger.yaml");
        assert_eq!(config.spec_path(Surface::Admin), "/admin/v1/swagger.yaml");
        assert_eq!(config.csrf_header, "X-CSRF-Token");
        assert_eq!(
            config.url_for("/ghc/v2/swagger.yaml").unwrap().as_str(),
            "https://office.example.com/ghc/v2/swagger.yaml"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = PortalConfig::with_base_url("not a url");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PortalConfig::default();
        config.apply_env_with(|key| match key {
            BASE_URL_ENV => Some("https://prime.example.com".to_string()),
            CSRF_COOKIE_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://prime.example.com");
        assert_eq!(config.csrf_cookie, "masked_gorilla_csrf");
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = [").unwrap();
        let err = PortalConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
