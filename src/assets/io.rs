use std::path::PathBuf;

use crate::errors::{Error, Result};

/// Asset reader trait.
/// Reads raw bytes from local files or network resources.
pub trait AssetReader: Send + Sync {
    fn read_bytes(&self, uri: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Local file reader.
#[derive(Debug, Clone, Default)]
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &std::path::Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        // tokio::fs needs a runtime context; route through the asset runtime
        // so callers on any executor can await this.
        let data = super::get_asset_runtime()
            .spawn(async move { tokio::fs::read(&path).await })
            .await??;
        Ok(data)
    }
}

/// HTTP network reader.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpAssetReader {
    headers: Vec<(String, String)>,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    #[must_use]
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let url = url::Url::parse(uri)?;
        let mut request = ehttp::Request::get(url.as_str());
        for (key, value) in &self.headers {
            request.headers.insert(key.clone(), value.clone());
        }
        let response = ehttp::fetch_async(request).await.map_err(Error::HttpError)?;
        if !response.ok {
            return Err(Error::HttpResponseError {
                status: response.status,
                url: response.url,
            });
        }
        Ok(response.bytes)
    }
}

/// Asset reader variant enum.
/// Avoids the runtime cost of trait objects.
#[derive(Debug, Clone)]
pub enum AssetReaderVariant {
    File(FileAssetReader),
    #[cfg(feature = "http")]
    Http(HttpAssetReader),
}

impl AssetReaderVariant {
    /// Picks the reader matching a resolved URI.
    pub fn from_uri(uri: &str, headers: &[(String, String)]) -> Result<Self> {
        if is_remote(uri) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(HttpAssetReader::new(headers.to_vec())))
            }
            #[cfg(not(feature = "http"))]
            {
                let _ = headers;
                Err(Error::FeatureNotEnabled(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`"
                        .to_string(),
                ))
            }
        } else {
            Ok(Self::File(FileAssetReader::default()))
        }
    }

    pub async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }
}

#[inline]
#[must_use]
pub fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Joins a loader base path and a file reference.
///
/// Like the engine's other loaders, the base path is a plain prefix: callers
/// include the trailing separator themselves (`"assets/hdri/"`). Absolute
/// URLs in `file` bypass the base path.
#[must_use]
pub fn resolve_uri(path: &str, file: &str) -> String {
    if is_remote(file) || path.is_empty() {
        file.to_string()
    } else {
        format!("{path}{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uri_prefixes_base_path() {
        assert_eq!(resolve_uri("env/", "px.png"), "env/px.png");
        assert_eq!(resolve_uri("", "/px.png"), "/px.png");
        assert_eq!(
            resolve_uri("env/", "https://cdn.example.com/a.hdr"),
            "https://cdn.example.com/a.hdr"
        );
    }

    #[test]
    fn reader_variant_by_scheme() {
        let file = AssetReaderVariant::from_uri("textures/px.png", &[]).unwrap();
        assert!(matches!(file, AssetReaderVariant::File(_)));
        #[cfg(feature = "http")]
        {
            let http = AssetReaderVariant::from_uri("https://example.com/a.hdr", &[]).unwrap();
            assert!(matches!(http, AssetReaderVariant::Http(_)));
        }
    }
}
