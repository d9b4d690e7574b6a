//! The backend API surfaces the portal talks to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One backend API exposed through its own Swagger document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// Customer-facing internal API.
    Internal,
    /// Admin console API.
    Admin,
    /// Government household goods (office) API.
    Ghc,
    /// Prime contractor API.
    Prime,
}

impl Surface {
    /// Every surface, in registry slot order.
    pub const ALL: [Surface; 4] = [
        Surface::Internal,
        Surface::Admin,
        Surface::Ghc,
        Surface::Prime,
    ];

    /// Lowercase surface name.
    pub fn as_str(self) -> &'static str {
        match self {
            Surface::Internal => "internal",
            Surface::Admin => "admin",
            Surface::Ghc => "ghc",
            Surface::Prime => "prime",
        }
    }

    /// Well-known path of the surface's Swagger document.
    pub fn default_spec_path(self) -> &'static str {
        match self {
            Surface::Internal => "/internal/swagger.yaml",
            Surface::Admin => "/admin/v1/swagger.yaml",
            Surface::Ghc => "/ghc/v1/swagger.yaml",
            Surface::Prime => "/prime/v1/swagger.yaml",
        }
    }

    /// Whether requests to this surface ride on the office session cookie.
    pub fn uses_session(self) -> bool {
        !matches!(self, Surface::Prime)
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Surface::Internal => 0,
            Surface::Admin => 1,
            Surface::Ghc => 2,
            Surface::Prime => 3,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "internal" => Ok(Surface::Internal),
            "admin" => Ok(Surface::Admin),
            "ghc" => Ok(Surface::Ghc),
            "prime" => Ok(Surface::Prime),
            other => Err(format!(
                "Unknown API surface '{other}' (expected internal, admin, ghc or prime)"
            )),
        }
    }
}
