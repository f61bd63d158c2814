//! Runtime platform detection.

use std::str::FromStr;

use crate::config::ConfigError;

/// Which sign-in sequence the runtime supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Browser runtime capable of auth popups.
    Web,
    /// Native or constrained runtime: delegated exchange through the device browser.
    Native,
}

impl Platform {
    /// Resolve the platform once at startup. An explicit override wins,
    /// otherwise `wasm32` targets are treated as web.
    #[must_use]
    pub fn detect(override_with: Option<Self>) -> Self {
        override_with.unwrap_or(if cfg!(target_arch = "wasm32") { Self::Web } else { Self::Native })
    }

    /// Hint line shown under the sign-in action.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::Web => "Testing on the web",
            Self::Native => "Native sign-in",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Native => "native",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "browser" => Ok(Self::Web),
            "native" | "mobile" | "desktop" => Ok(Self::Native),
            other => Err(ConfigError::Parse(format!("unknown platform: {other}"))),
        }
    }
}
