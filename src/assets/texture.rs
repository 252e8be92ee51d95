//! Texture Data
//!
//! CPU-side texture containers produced by the environment pipeline:
//!
//! - [`SourceTexture`]: decoded source pixels (one equirectangular panorama or
//!   six cube faces), immutable once decoded.
//! - [`EnvironmentMap`]: the prefiltered radiance mip chain derived from a
//!   source. Its pixel memory is released explicitly via
//!   [`EnvironmentMap::dispose`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use glam::{Vec3, Vec4};
use parking_lot::RwLock;
use wgpu::{TextureFormat, TextureViewDimension};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

fn next_texture_id() -> u64 {
    NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Color space hint applied when decoding 8-bit sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

// ============================================================================
// SourceTexture
// ============================================================================

/// Decoded source image data.
///
/// `layers` is 1 for an equirectangular panorama and 6 for a cube map; cube
/// faces are stored back to back in `+X, -X, +Y, -Y, +Z, -Z` order.
#[derive(Debug)]
pub struct SourceTexture {
    id: u64,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub format: TextureFormat,
    pub view_dimension: TextureViewDimension,
    pub data: Vec<u8>,
}

impl SourceTexture {
    #[must_use]
    pub fn new(
        label: &str,
        width: u32,
        height: u32,
        layers: u32,
        format: TextureFormat,
        data: Vec<u8>,
    ) -> Self {
        let view_dimension = if layers == 6 {
            TextureViewDimension::Cube
        } else {
            TextureViewDimension::D2
        };
        Self {
            id: next_texture_id(),
            label: label.to_string(),
            width,
            height,
            layers,
            format,
            view_dimension,
            data,
        }
    }

    /// Process-unique identifier of this decode.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn is_cube(&self) -> bool {
        self.view_dimension == TextureViewDimension::Cube
    }

    #[inline]
    fn bytes_per_texel(&self) -> usize {
        match self.format {
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
            _ => 4,
        }
    }

    /// Reads one texel as linear RGBA.
    ///
    /// Coordinates are clamped to the layer bounds. 8-bit sRGB data is
    /// linearized; 16-bit float data is widened through `half`.
    #[must_use]
    pub fn texel(&self, layer: u32, x: u32, y: u32) -> Vec4 {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let layer = layer.min(self.layers.saturating_sub(1));

        let bpt = self.bytes_per_texel();
        let layer_stride = (self.width * self.height) as usize * bpt;
        let offset = layer as usize * layer_stride + (y * self.width + x) as usize * bpt;
        let Some(bytes) = self.data.get(offset..offset + bpt) else {
            return Vec4::ZERO;
        };

        match self.format {
            TextureFormat::Rgba16Float => {
                let c = |i: usize| half::f16::from_le_bytes([bytes[i], bytes[i + 1]]).to_f32();
                Vec4::new(c(0), c(2), c(4), c(6))
            }
            TextureFormat::Rgba32Float => {
                let c = |i: usize| {
                    f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
                };
                Vec4::new(c(0), c(4), c(8), c(12))
            }
            TextureFormat::Rgba8UnormSrgb => Vec4::new(
                srgb_to_linear(bytes[0]),
                srgb_to_linear(bytes[1]),
                srgb_to_linear(bytes[2]),
                f32::from(bytes[3]) / 255.0,
            ),
            _ => Vec4::new(
                f32::from(bytes[0]) / 255.0,
                f32::from(bytes[1]) / 255.0,
                f32::from(bytes[2]) / 255.0,
                f32::from(bytes[3]) / 255.0,
            ),
        }
    }

    /// Bilinear sample of an equirectangular layer at normalized `(u, v)`.
    /// `u` wraps horizontally, `v` clamps.
    #[must_use]
    pub fn sample_bilinear(&self, layer: u32, u: f32, v: f32) -> Vec4 {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        let fx = u.rem_euclid(1.0) * w - 0.5;
        let fy = (v.clamp(0.0, 1.0) * h - 0.5).max(0.0);

        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let wrap = |x: f32| (x.rem_euclid(w)) as u32;
        let (xa, xb) = (wrap(x0), wrap(x0 + 1.0));
        let (ya, yb) = (y0 as u32, (y0 + 1.0) as u32);

        let top = self.texel(layer, xa, ya).lerp(self.texel(layer, xb, ya), tx);
        let bottom = self.texel(layer, xa, yb).lerp(self.texel(layer, xb, yb), tx);
        top.lerp(bottom, ty)
    }
}

#[inline]
fn srgb_to_linear(v: u8) -> f32 {
    let c = f32::from(v) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

// ============================================================================
// EnvironmentMap
// ============================================================================

/// One level of a prefiltered cube mip chain.
#[derive(Debug, Clone)]
pub struct MipLevel {
    /// Edge length of each face in texels.
    pub size: u32,
    /// Roughness this level approximates, in `[0, 1]`.
    pub roughness: f32,
    /// Six faces, `size * size` RGBA texels each.
    pub texels: Vec<Vec4>,
}

/// Prefiltered environment radiance, ready to be used as lighting or as a
/// background.
///
/// The pixel memory is not reclaimed passively: whoever installed the map
/// calls [`dispose`](Self::dispose) once it is no longer referenced by a scene.
#[derive(Debug)]
pub struct EnvironmentMap {
    id: u64,
    pub label: String,
    /// Whether the map was derived from a cube source (vs. a panorama).
    pub from_cube: bool,
    levels: RwLock<Option<Vec<MipLevel>>>,
    disposed: AtomicBool,
}

impl EnvironmentMap {
    #[must_use]
    pub fn new(label: &str, from_cube: bool, levels: Vec<MipLevel>) -> Self {
        Self {
            id: next_texture_id(),
            label: label.to_string(),
            from_cube,
            levels: RwLock::new(Some(levels)),
            disposed: AtomicBool::new(false),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Base face size, or 0 once disposed.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.levels
            .read()
            .as_ref()
            .and_then(|l| l.first())
            .map_or(0, |l| l.size)
    }

    #[must_use]
    pub fn mip_level_count(&self) -> u32 {
        self.levels.read().as_ref().map_or(0, |l| l.len() as u32)
    }

    /// Highest mip index, used as the roughness LOD range.
    #[must_use]
    pub fn max_mip_level(&self) -> f32 {
        self.mip_level_count().saturating_sub(1) as f32
    }

    /// Samples a face texel of a mip level. Returns `None` when disposed or
    /// out of range.
    #[must_use]
    pub fn texel(&self, level: u32, face: u32, x: u32, y: u32) -> Option<Vec4> {
        let guard = self.levels.read();
        let mip = guard.as_ref()?.get(level as usize)?;
        if face >= 6 || x >= mip.size || y >= mip.size {
            return None;
        }
        let face_len = (mip.size * mip.size) as usize;
        mip.texels
            .get(face as usize * face_len + (y * mip.size + x) as usize)
            .copied()
    }

    /// Nearest-texel lookup along a world direction.
    #[must_use]
    pub fn sample_direction(&self, dir: Vec3, level: u32) -> Option<Vec4> {
        let size = self.levels.read().as_ref()?.get(level as usize)?.size;
        let (face, u, v) = crate::ibl::direction_to_face_uv(dir);
        let x = ((u * size as f32) as u32).min(size - 1);
        let y = ((v * size as f32) as u32).min(size - 1);
        self.texel(level, face, x, y)
    }

    /// Releases the pixel memory. Idempotent.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.levels.write().take();
            log::debug!("Disposed environment map '{}' (#{})", self.label, self.id);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl PartialEq for EnvironmentMap {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for EnvironmentMap {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_endpoints() {
        assert!(srgb_to_linear(0).abs() < 1e-6);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn texel_reads_half_floats() {
        let mut data = Vec::new();
        for v in [0.5_f32, 1.0, 2.0, 1.0] {
            data.extend_from_slice(&half::f16::from_f32(v).to_le_bytes());
        }
        let tex = SourceTexture::new("hdr", 1, 1, 1, TextureFormat::Rgba16Float, data);
        assert_eq!(tex.texel(0, 0, 0), Vec4::new(0.5, 1.0, 2.0, 1.0));
    }

    #[test]
    fn dispose_releases_levels_once() {
        let level = MipLevel {
            size: 1,
            roughness: 0.0,
            texels: vec![Vec4::ONE; 6],
        };
        let map = EnvironmentMap::new("env", true, vec![level]);
        assert_eq!(map.size(), 1);
        map.dispose();
        map.dispose();
        assert!(map.is_disposed());
        assert_eq!(map.size(), 0);
        assert!(map.texel(0, 0, 0, 0).is_none());
    }
}
