use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::BindError;

/// Where a document lives. Relative references found inside a document are
/// resolved against the location it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self, BindError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(BindError::InvalidLocation {
                raw: raw.to_string(),
                reason: "location is empty".to_string(),
            });
        }

        if let Some(location) = parse_absolute_url(raw)? {
            return Ok(location);
        }

        Ok(Self::File(normalize_path(Path::new(raw))))
    }

    pub fn join(&self, reference: &str) -> Result<Self, BindError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(BindError::InvalidLocation {
                raw: reference.to_string(),
                reason: format!("empty reference relative to {}", self),
            });
        }

        if let Some(location) = parse_absolute_url(reference)? {
            return Ok(location);
        }

        match self {
            Self::Url(base) => {
                base.join(reference)
                    .map(Self::Url)
                    .map_err(|error| BindError::InvalidLocation {
                        raw: reference.to_string(),
                        reason: error.to_string(),
                    })
            }
            Self::File(path) => {
                let candidate = Path::new(reference);
                if candidate.is_absolute() {
                    return Ok(Self::File(normalize_path(candidate)));
                }
                let parent = path.parent().unwrap_or_else(|| Path::new(""));
                Ok(Self::File(normalize_path(&parent.join(candidate))))
            }
        }
    }

    /// Deduplication key: the normalized textual form of the location.
    /// Locations joined from one root share its form, so a relative root
    /// yields relative keys.
    pub fn key(&self) -> String {
        match self {
            Self::File(path) => path.to_string_lossy().replace('\\', "/"),
            Self::Url(url) => url.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn parse_absolute_url(raw: &str) -> Result<Option<Location>, BindError> {
    let Ok(url) = Url::parse(raw) else {
        return Ok(None);
    };

    match url.scheme() {
        "http" | "https" => Ok(Some(Location::Url(url))),
        "file" => url
            .to_file_path()
            .map(|path| Some(Location::File(normalize_path(&path))))
            .map_err(|_| BindError::InvalidLocation {
                raw: raw.to_string(),
                reason: "file URL does not name a local path".to_string(),
            }),
        // Windows drive letters parse as single-letter schemes.
        _ => Ok(None),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|component| component.as_os_str()).collect()
}
