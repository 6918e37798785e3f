//! Asset locators.
//!
//! A locator is classified exactly once, when it crosses the request
//! boundary. Downstream code matches on the variant instead of re-inspecting
//! strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{ModelError, ModelResult};

const REMOTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Where an input asset lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    /// A file already present on this host.
    Local(PathBuf),
    /// An HTTP(S) resource that must be fetched before use.
    Remote(Url),
}

impl Locator {
    /// Classify a raw locator string.
    ///
    /// Anything starting with `http://` or `https://` (case-insensitive) is
    /// remote and must parse as a URL; everything else is a local path.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelError::invalid_locator("locator is empty"));
        }

        if is_remote(trimmed) {
            let url = Url::parse(trimmed)
                .map_err(|e| ModelError::invalid_locator(format!("{trimmed}: {e}")))?;
            Ok(Self::Remote(url))
        } else {
            Ok(Self::Local(PathBuf::from(trimmed)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote(_) => None,
        }
    }

    pub fn as_remote(&self) -> Option<&Url> {
        match self {
            Self::Remote(url) => Some(url),
            Self::Local(_) => None,
        }
    }

    /// Lower-cased file extension of the path component, if any.
    pub fn extension(&self) -> Option<String> {
        let ext = match self {
            Self::Local(path) => path.extension()?.to_str()?.to_string(),
            Self::Remote(url) => {
                let last = url.path_segments()?.next_back()?;
                Path::new(last).extension()?.to_str()?.to_string()
            }
        };
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

fn is_remote(raw: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| {
        raw.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

impl TryFrom<String> for Locator {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(value: Locator) -> Self {
        value.to_string()
    }
}

impl From<PathBuf> for Locator {
    fn from(value: PathBuf) -> Self {
        Self::Local(value)
    }
}
