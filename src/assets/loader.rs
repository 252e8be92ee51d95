//! Texture Decoders
//!
//! Two decoders back the environment pipeline:
//!
//! - [`CubeTextureLoader`]: six face images (PNG/JPEG/WebP/...) combined into a
//!   single 6-layer [`SourceTexture`].
//! - [`HdrLoader`]: one equirectangular panorama, decoded to `Rgba16Float`.
//!   Radiance `.hdr` (RGBE) and OpenEXR are the common inputs; any format the
//!   `image` crate understands is accepted.
//!
//! Both read bytes through [`AssetReaderVariant`] and decode on the blocking
//! pool, so awaiting them never stalls the caller's executor.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use image::GenericImageView;
use wgpu::TextureFormat;

use super::io::{resolve_uri, AssetReaderVariant};
use super::texture::{ColorSpace, SourceTexture};
use crate::errors::{Error, Result};

/// Loader state the caller may adjust before a load starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderSettings {
    /// Prefix joined with every file reference.
    pub path: String,
    /// Color space of 8-bit sources.
    pub color_space: ColorSpace,
    /// Extra headers sent with remote requests.
    pub request_headers: Vec<(String, String)>,
}

impl LoaderSettings {
    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = path.into();
        self
    }

    pub fn set_color_space(&mut self, color_space: ColorSpace) -> &mut Self {
        self.color_space = color_space;
        self
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.request_headers.push((key.into(), value.into()));
        self
    }
}

/// Hook invoked with the loader settings right before loading.
pub type LoaderExtensions = Arc<dyn Fn(&mut LoaderSettings) + Send + Sync>;

/// Which decoder a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    Cube,
    Equirectangular,
}

/// A fully resolved decode job.
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub kind: DecoderKind,
    pub files: Vec<String>,
    pub settings: LoaderSettings,
}

impl DecodeRequest {
    /// Final URIs, base path applied.
    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| resolve_uri(&self.settings.path, f))
            .collect()
    }
}

/// Asynchronous image decoder.
pub trait TextureDecoder: Send + Sync {
    fn decode(&self, request: DecodeRequest) -> BoxFuture<'static, Result<SourceTexture>>;
}

// ============================================================================
// Shared helpers
// ============================================================================

async fn read_uri(uri: String, headers: Vec<(String, String)>) -> Result<Vec<u8>> {
    let reader = AssetReaderVariant::from_uri(&uri, &headers)?;
    log::debug!("Reading '{uri}'");
    reader.read_bytes(&uri).await
}

/// Runs CPU-heavy work on the asset runtime's blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    super::get_asset_runtime().spawn_blocking(f).await?
}

fn decode_ldr_cpu(bytes: &[u8], label: &str) -> Result<(u32, u32, Vec<u8>)> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageDecodeError(format!("Failed to decode image {label}: {e}")))?;
    let (width, height) = img.dimensions();
    Ok((width, height, img.to_rgba8().into_vec()))
}

fn decode_hdr_cpu(bytes: &[u8], label: &str) -> Result<SourceTexture> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageDecodeError(format!("Failed to decode HDR {label}: {e}")))?;

    let width = img.width();
    let height = img.height();
    let rgb32f = img.into_rgb32f();

    // Convert RGB32F to RGBA16F (half float)
    let mut rgba_f16_data = Vec::with_capacity((width * height * 4) as usize * 2);
    for pixel in rgb32f.pixels() {
        for c in [pixel[0], pixel[1], pixel[2], 1.0] {
            rgba_f16_data.extend_from_slice(&half::f16::from_f32(c).to_le_bytes());
        }
    }

    Ok(SourceTexture::new(
        label,
        width,
        height,
        1,
        TextureFormat::Rgba16Float,
        rgba_f16_data,
    ))
}

// ============================================================================
// CubeTextureLoader
// ============================================================================

/// Loads six face images into one cube texture.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubeTextureLoader;

impl CubeTextureLoader {
    pub async fn load(request: DecodeRequest) -> Result<SourceTexture> {
        if request.files.len() != 6 {
            return Err(Error::CubeMapError(format!(
                "cube map needs 6 faces, got {}",
                request.files.len()
            )));
        }
        let color_space = request.settings.color_space;
        let headers = request.settings.request_headers.clone();

        // Concurrently load 6 images
        let faces = request.uris().into_iter().map(|uri| {
            let headers = headers.clone();
            async move {
                let bytes = read_uri(uri.clone(), headers).await?;
                run_blocking(move || decode_ldr_cpu(&bytes, &uri)).await
            }
        });
        let faces = futures::future::try_join_all(faces).await?;

        let (width, height) = (faces[0].0, faces[0].1);
        if faces.iter().any(|(w, h, _)| *w != width || *h != height) {
            return Err(Error::CubeMapError(
                "Cube map images must have same dimensions".to_string(),
            ));
        }
        if width != height {
            return Err(Error::CubeMapError(format!(
                "Cube map faces must be square, got {width}x{height}"
            )));
        }

        let mut combined = Vec::with_capacity((width * height * 4 * 6) as usize);
        for (_, _, data) in faces {
            combined.extend(data);
        }

        let format = match color_space {
            ColorSpace::Srgb => TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => TextureFormat::Rgba8Unorm,
        };
        Ok(SourceTexture::new("CubeMap", width, height, 6, format, combined))
    }
}

impl TextureDecoder for CubeTextureLoader {
    fn decode(&self, request: DecodeRequest) -> BoxFuture<'static, Result<SourceTexture>> {
        Self::load(request).boxed()
    }
}

// ============================================================================
// HdrLoader
// ============================================================================

/// Loads one equirectangular panorama.
#[derive(Debug, Clone, Copy, Default)]
pub struct HdrLoader;

impl HdrLoader {
    pub async fn load(request: DecodeRequest) -> Result<SourceTexture> {
        let [file] = request.files.as_slice() else {
            return Err(Error::InvalidSource(format!(
                "equirectangular source needs exactly 1 file, got {}",
                request.files.len()
            )));
        };
        let uri = resolve_uri(&request.settings.path, file);
        let bytes = read_uri(uri.clone(), request.settings.request_headers.clone()).await?;
        run_blocking(move || decode_hdr_cpu(&bytes, &uri)).await
    }
}

impl TextureDecoder for HdrLoader {
    fn decode(&self, request: DecodeRequest) -> BoxFuture<'static, Result<SourceTexture>> {
        Self::load(request).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_builder_chains() {
        let mut settings = LoaderSettings::default();
        settings
            .set_path("env/")
            .set_color_space(ColorSpace::Linear)
            .add_header("Authorization", "token");
        assert_eq!(settings.path, "env/");
        assert_eq!(settings.color_space, ColorSpace::Linear);
        assert_eq!(settings.request_headers.len(), 1);
    }

    #[test]
    fn hdr_decode_produces_half_floats() {
        let img = image::Rgb32FImage::from_pixel(2, 1, image::Rgb([2.0, 0.5, 0.25]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb32F(img)
            .write_to(&mut bytes, image::ImageFormat::Hdr)
            .unwrap();

        let tex = decode_hdr_cpu(bytes.get_ref(), "test.hdr").unwrap();
        assert_eq!((tex.width, tex.height, tex.layers), (2, 1, 1));
        assert_eq!(tex.format, TextureFormat::Rgba16Float);
        let t = tex.texel(0, 1, 0);
        assert!((t.x - 2.0).abs() < 0.05 && (t.w - 1.0).abs() < 1e-3);
    }

    #[test]
    fn cube_loader_rejects_wrong_face_count() {
        let request = DecodeRequest {
            kind: DecoderKind::Cube,
            files: vec!["px.png".into()],
            settings: LoaderSettings::default(),
        };
        let err = pollster::block_on(CubeTextureLoader::load(request)).unwrap_err();
        assert!(matches!(err, Error::CubeMapError(_)));
    }
}
