use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::assets::loader::DecoderKind;
use crate::errors::Error;

/// Where an environment's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentSource {
    /// Six cube faces in `+X, -X, +Y, -Y, +Z, -Z` order.
    Cubemap([String; 6]),
    /// One equirectangular panorama (typically `.hdr`).
    Equirectangular(String),
}

impl Default for EnvironmentSource {
    fn default() -> Self {
        Self::Cubemap(
            ["/px.png", "/nx.png", "/py.png", "/ny.png", "/pz.png", "/nz.png"]
                .map(str::to_string),
        )
    }
}

impl EnvironmentSource {
    #[must_use]
    pub fn cubemap<S: Into<String>>(faces: [S; 6]) -> Self {
        Self::Cubemap(faces.map(Into::into))
    }

    #[must_use]
    pub fn equirectangular(file: impl Into<String>) -> Self {
        Self::Equirectangular(file.into())
    }

    #[must_use]
    pub fn kind(&self) -> DecoderKind {
        match self {
            Self::Cubemap(_) => DecoderKind::Cube,
            Self::Equirectangular(_) => DecoderKind::Equirectangular,
        }
    }

    #[must_use]
    pub fn files(&self) -> Vec<String> {
        match self {
            Self::Cubemap(faces) => faces.to_vec(),
            Self::Equirectangular(file) => vec![file.clone()],
        }
    }
}

impl From<&str> for EnvironmentSource {
    fn from(file: &str) -> Self {
        Self::Equirectangular(file.to_string())
    }
}

/// File-list form: one entry is a panorama, six entries are cube faces.
impl TryFrom<Vec<String>> for EnvironmentSource {
    type Error = Error;

    fn try_from(files: Vec<String>) -> Result<Self, Self::Error> {
        match files.len() {
            1 => Ok(Self::Equirectangular(files.into_iter().next().unwrap_or_default())),
            6 => {
                let faces: [String; 6] = files
                    .try_into()
                    .map_err(|_| Error::InvalidSource("expected 6 cube faces".to_string()))?;
                Ok(Self::Cubemap(faces))
            }
            n => Err(Error::InvalidSource(format!(
                "expected 1 panorama or 6 cube faces, got {n} files"
            ))),
        }
    }
}

/// A source with its base path fixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedSource {
    pub source: EnvironmentSource,
    pub path: String,
}

impl ResolvedSource {
    /// Stable content hash of kind, base path and file list.
    ///
    /// Two requests for the same files under the same path share a key no
    /// matter which `Environment` issued them.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut buf = String::new();
        buf.push_str(match self.source.kind() {
            DecoderKind::Cube => "cube",
            DecoderKind::Equirectangular => "equirect",
        });
        buf.push('\0');
        buf.push_str(&self.path);
        for file in self.source.files() {
            buf.push('\0');
            buf.push_str(&file);
        }
        xxh3_64(buf.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_depends_on_path_and_files() {
        let a = ResolvedSource {
            source: EnvironmentSource::equirectangular("a.hdr"),
            path: "env/".into(),
        };
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.path = "other/".into();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn file_list_shape_selects_variant() {
        let one = EnvironmentSource::try_from(vec!["a.hdr".to_string()]).unwrap();
        assert_eq!(one.kind(), DecoderKind::Equirectangular);
        let six: Vec<String> = (0..6).map(|i| format!("{i}.png")).collect();
        assert_eq!(EnvironmentSource::try_from(six).unwrap().kind(), DecoderKind::Cube);
        assert!(EnvironmentSource::try_from(vec!["a".into(), "b".into()]).is_err());
    }
}
