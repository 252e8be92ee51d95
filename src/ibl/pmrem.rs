//! Prefiltered Radiance (PMREM) Generation
//!
//! [`IblBackend`] stands for the rendering context that owns prefiltering; it
//! hands out short-lived [`PmremGenerator`]s. [`derive_environment`] is the
//! single entry point used by the environment pipeline: it picks the cube or
//! equirectangular path from the source layout and always disposes the
//! generator afterwards.
//!
//! [`CpuIblBackend`] is the reference implementation. Level 0 is the source
//! resampled into a cube of `face_size`. Every following level halves the
//! resolution and stands for a higher roughness: its texels are a
//! cosine-power weighted average over the whole sphere, with the lobe
//! exponent derived from the level's GGX roughness. When the lobe is
//! narrower than a source texel the 2×2 box filter is used as is.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec3, Vec4};

use super::{direction_to_equirect_uv, direction_to_face_uv, face_uv_to_direction};
use crate::assets::texture::{EnvironmentMap, MipLevel, SourceTexture};
use crate::errors::{Error, Result};

pub trait PmremGenerator: Send {
    /// Prefilters a 6-layer cube source.
    fn from_cubemap(&mut self, source: &SourceTexture) -> Result<EnvironmentMap>;

    /// Prefilters a single-layer equirectangular source.
    fn from_equirectangular(&mut self, source: &SourceTexture) -> Result<EnvironmentMap>;

    /// Releases generator-owned scratch resources.
    fn dispose(&mut self);
}

pub trait IblBackend: Send + Sync {
    fn create_pmrem_generator(&self) -> Box<dyn PmremGenerator>;
}

/// Derives the prefiltered map for `source` with a fresh generator.
pub fn derive_environment(backend: &dyn IblBackend, source: &SourceTexture) -> Result<EnvironmentMap> {
    let mut generator = backend.create_pmrem_generator();
    let result = if source.is_cube() {
        generator.from_cubemap(source)
    } else {
        generator.from_equirectangular(source)
    };
    generator.dispose();
    result
}

// ============================================================================
// CPU reference backend
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct CpuIblBackend {
    /// Edge length of level 0.
    pub face_size: u32,
    /// Upper bound on the number of mip levels.
    pub max_mip_levels: u32,
}

impl Default for CpuIblBackend {
    fn default() -> Self {
        Self {
            face_size: 128,
            max_mip_levels: 8,
        }
    }
}

impl IblBackend for CpuIblBackend {
    fn create_pmrem_generator(&self) -> Box<dyn PmremGenerator> {
        Box::new(CpuPmremGenerator::new(self.face_size, self.max_mip_levels))
    }
}

pub struct CpuPmremGenerator {
    face_size: u32,
    max_mip_levels: u32,
    scratch: Vec<Vec4>,
}

impl CpuPmremGenerator {
    #[must_use]
    pub fn new(face_size: u32, max_mip_levels: u32) -> Self {
        Self {
            face_size: face_size.max(1).next_power_of_two(),
            max_mip_levels: max_mip_levels.max(1),
            scratch: Vec::new(),
        }
    }

    fn mip_count(&self) -> u32 {
        (self.face_size.ilog2() + 1).min(self.max_mip_levels)
    }

    /// Fills `scratch` with level 0 using `sample(direction)`.
    fn resample(&mut self, sample: impl Fn(glam::Vec3) -> Vec4) {
        let size = self.face_size;
        self.scratch.clear();
        self.scratch.reserve((size * size * 6) as usize);
        for face in 0..6 {
            for y in 0..size {
                for x in 0..size {
                    let u = (x as f32 + 0.5) / size as f32;
                    let v = (y as f32 + 0.5) / size as f32;
                    self.scratch.push(sample(face_uv_to_direction(face, u, v)));
                }
            }
        }
    }

    fn build_chain(&mut self, label: &str, from_cube: bool) -> EnvironmentMap {
        let count = self.mip_count();

        // Box chain all the way down to 1×1; gathers read from it.
        let mut boxes = vec![MipLevel {
            size: self.face_size,
            roughness: 0.0,
            texels: std::mem::take(&mut self.scratch),
        }];
        while let Some(prev) = boxes.last().filter(|l| l.size > 1) {
            let size = prev.size / 2;
            let texels = downsample(prev, size);
            boxes.push(MipLevel {
                size,
                roughness: 0.0,
                texels,
            });
        }

        let gather_min = GATHER_MIN_SIZE.min(self.face_size);
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(boxes[0].clone());
        for level in 1..count as usize {
            let roughness = level as f32 / (count - 1).max(1) as f32;
            let boxed = &boxes[level];
            let src_size = boxed.size.clamp(gather_min, GATHER_MAX_SIZE);
            let texels = boxes
                .iter()
                .find(|l| l.size == src_size)
                .and_then(|src| prefilter(src, boxed, roughness))
                .unwrap_or_else(|| boxed.texels.clone());
            levels.push(MipLevel {
                size: boxed.size,
                roughness,
                texels,
            });
        }

        EnvironmentMap::new(label, from_cube, levels)
    }
}

/// Face edge bounds of the level a lobe gather reads from.
const GATHER_MIN_SIZE: u32 = 8;
const GATHER_MAX_SIZE: u32 = 32;

/// Blinn-Phong exponent matching a GGX roughness, floored at a cosine lobe.
fn lobe_exponent(roughness: f32) -> f32 {
    let alpha = (roughness * roughness).max(1e-3);
    (2.0 / (alpha * alpha) - 2.0).max(1.0)
}

/// Convolves `src` with the roughness lobe at every texel direction of
/// `out`. Returns `None` when the lobe is too narrow to be resolved by `src`.
fn prefilter(src: &MipLevel, out: &MipLevel, roughness: f32) -> Option<Vec<Vec4>> {
    let exponent = lobe_exponent(roughness);
    let half_width = 0.5f32.powf(exponent.recip()).acos();
    if half_width < FRAC_PI_2 / src.size as f32 {
        return None;
    }
    // Weights below this are dropped.
    let cutoff = 1e-4f32.powf(exponent.recip());

    let samples: Vec<(Vec3, f32, Vec4)> = cube_texels(src.size)
        .zip(&src.texels)
        .map(|((dir, solid_angle), &texel)| (dir, solid_angle, texel))
        .collect();

    let texels = cube_texels(out.size)
        .zip(&out.texels)
        .map(|((normal, _), &fallback)| {
            let mut sum = Vec4::ZERO;
            let mut weight = 0.0;
            for &(dir, solid_angle, texel) in &samples {
                let d = normal.dot(dir);
                if d > cutoff {
                    let w = d.powf(exponent) * solid_angle;
                    sum += texel * w;
                    weight += w;
                }
            }
            if weight > 0.0 { sum / weight } else { fallback }
        })
        .collect();
    Some(texels)
}

/// Texel center directions and solid angles of a cube face set, in storage
/// order.
fn cube_texels(size: u32) -> impl Iterator<Item = (Vec3, f32)> {
    let texel = 2.0 / size as f32;
    (0..6u32).flat_map(move |face| {
        (0..size).flat_map(move |y| {
            (0..size).map(move |x| {
                let u = (x as f32 + 0.5) / size as f32;
                let v = (y as f32 + 0.5) / size as f32;
                let (s, t) = (2.0 * u - 1.0, 2.0 * v - 1.0);
                let solid_angle = texel * texel / (1.0 + s * s + t * t).powf(1.5);
                (face_uv_to_direction(face, u, v), solid_angle)
            })
        })
    })
}

fn downsample(prev: &MipLevel, size: u32) -> Vec<Vec4> {
    let src = prev.size;
    let src_face = (src * src) as usize;
    let mut out = Vec::with_capacity((size * size * 6) as usize);
    for face in 0..6usize {
        let base = face * src_face;
        for y in 0..size {
            for x in 0..size {
                let (x0, y0) = ((x * 2).min(src - 1), (y * 2).min(src - 1));
                let (x1, y1) = ((x0 + 1).min(src - 1), (y0 + 1).min(src - 1));
                let at = |xx: u32, yy: u32| prev.texels[base + (yy * src + xx) as usize];
                out.push((at(x0, y0) + at(x1, y0) + at(x0, y1) + at(x1, y1)) * 0.25);
            }
        }
    }
    out
}

impl PmremGenerator for CpuPmremGenerator {
    fn from_cubemap(&mut self, source: &SourceTexture) -> Result<EnvironmentMap> {
        if source.layers != 6 || source.width == 0 {
            return Err(Error::ConvolutionError(format!(
                "'{}' is not a cube map ({} layers)",
                source.label, source.layers
            )));
        }
        let (w, h) = (source.width as f32, source.height as f32);
        self.resample(|dir| {
            let (face, u, v) = direction_to_face_uv(dir);
            let x = ((u * w) as u32).min(source.width - 1);
            let y = ((v * h) as u32).min(source.height - 1);
            source.texel(face, x, y)
        });
        log::debug!("PMREM: prefiltered cube source '{}'", source.label);
        Ok(self.build_chain(&source.label, true))
    }

    fn from_equirectangular(&mut self, source: &SourceTexture) -> Result<EnvironmentMap> {
        if source.layers != 1 || source.width == 0 || source.height == 0 {
            return Err(Error::ConvolutionError(format!(
                "'{}' is not an equirectangular image",
                source.label
            )));
        }
        self.resample(|dir| {
            let (u, v) = direction_to_equirect_uv(dir);
            source.sample_bilinear(0, u, v)
        });
        log::debug!("PMREM: prefiltered equirectangular source '{}'", source.label);
        Ok(self.build_chain(&source.label, false))
    }

    fn dispose(&mut self) {
        self.scratch = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    fn solid_cube(size: u32, rgba: [u8; 4]) -> SourceTexture {
        let data = rgba.repeat((size * size * 6) as usize);
        SourceTexture::new("solid", size, size, 6, TextureFormat::Rgba8Unorm, data)
    }

    #[test]
    fn chain_halves_until_limit() {
        let mut generator = CpuPmremGenerator::new(16, 8);
        let map = generator.from_cubemap(&solid_cube(4, [255, 0, 0, 255])).unwrap();
        assert_eq!(map.mip_level_count(), 5);
        assert_eq!(map.size(), 16);
        assert!((map.max_mip_level() - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn solid_input_stays_solid() {
        let mut generator = CpuPmremGenerator::new(8, 4);
        let map = generator.from_cubemap(&solid_cube(2, [255, 0, 0, 255])).unwrap();
        let top = map.texel(3, 2, 0, 0).unwrap();
        assert!((top.x - 1.0).abs() < 1e-5 && top.y.abs() < 1e-5);
    }

    #[test]
    fn rough_levels_spread_light_across_faces() {
        // Only +X is lit.
        let size = 8u32;
        let data: Vec<u8> = (0..6)
            .flat_map(|face| {
                let c = if face == 0 { 255 } else { 0 };
                [c, c, c, 255].repeat((size * size) as usize)
            })
            .collect();
        let source = SourceTexture::new("lit", size, size, 6, TextureFormat::Rgba8Unorm, data);

        let mut generator = CpuPmremGenerator::new(16, 4);
        let map = generator.from_cubemap(&source).unwrap();

        // Level 0 keeps the faces apart.
        assert!(map.texel(0, 2, 15, 0).unwrap().x.abs() < 1e-5);

        // The roughest level bleeds +X onto the neighbouring +Y face but not
        // onto the opposite -X face.
        let top = map.texel(3, 2, 1, 0).unwrap().x;
        let back = map.texel(3, 1, 0, 0).unwrap().x;
        let front = map.texel(3, 0, 0, 0).unwrap().x;
        assert!(top > 0.05 && top < front, "top {top}, front {front}");
        assert!(back < top, "back {back}, top {top}");
        assert!(front < 1.0);
    }

    #[test]
    fn lobe_exponent_runs_from_sharp_to_cosine() {
        assert!(lobe_exponent(0.1) > 1000.0);
        assert!((lobe_exponent(1.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn wrong_layout_is_rejected() {
        let mut generator = CpuPmremGenerator::new(8, 4);
        let err = generator.from_equirectangular(&solid_cube(2, [0; 4])).unwrap_err();
        assert!(matches!(err, Error::ConvolutionError(_)));
    }
}
