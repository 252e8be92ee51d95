//! Image-Based Lighting
//!
//! Cube-face addressing helpers and the prefiltering (PMREM) seam used by the
//! environment pipeline.
//!
//! Faces follow the usual cube map order `+X, -X, +Y, -Y, +Z, -Z`; `(u, v)`
//! are in `[0, 1]` with `v` growing downwards.

pub mod pmrem;

use glam::Vec3;

pub use pmrem::{derive_environment, CpuIblBackend, CpuPmremGenerator, IblBackend, PmremGenerator};

/// Maps a direction to `(face, u, v)`.
#[must_use]
pub fn direction_to_face_uv(dir: Vec3) -> (u32, f32, f32) {
    let a = dir.abs();
    let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
        if dir.x > 0.0 {
            (0, -dir.z, -dir.y, a.x)
        } else {
            (1, dir.z, -dir.y, a.x)
        }
    } else if a.y >= a.z {
        if dir.y > 0.0 {
            (2, dir.x, dir.z, a.y)
        } else {
            (3, dir.x, -dir.z, a.y)
        }
    } else if dir.z > 0.0 {
        (4, dir.x, -dir.y, a.z)
    } else {
        (5, -dir.x, -dir.y, a.z)
    };

    if ma <= f32::EPSILON {
        return (4, 0.5, 0.5);
    }
    (face, 0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0))
}

/// Maps `(face, u, v)` to a unit direction. Inverse of [`direction_to_face_uv`].
#[must_use]
pub fn face_uv_to_direction(face: u32, u: f32, v: f32) -> Vec3 {
    let sc = 2.0 * u - 1.0;
    let tc = 2.0 * v - 1.0;
    let dir = match face {
        0 => Vec3::new(1.0, -tc, -sc),
        1 => Vec3::new(-1.0, -tc, sc),
        2 => Vec3::new(sc, 1.0, tc),
        3 => Vec3::new(sc, -1.0, -tc),
        4 => Vec3::new(sc, -tc, 1.0),
        _ => Vec3::new(-sc, -tc, -1.0),
    };
    dir.normalize()
}

/// Latitude-longitude coordinates of a direction, `v = 0` at the zenith.
#[must_use]
pub fn direction_to_equirect_uv(dir: Vec3) -> (f32, f32) {
    let u = dir.z.atan2(dir.x) / std::f32::consts::TAU + 0.5;
    let v = 0.5 - dir.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI;
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_mapping_round_trips_at_centers() {
        for face in 0..6 {
            let dir = face_uv_to_direction(face, 0.5, 0.5);
            let (f, u, v) = direction_to_face_uv(dir);
            assert_eq!(f, face);
            assert!((u - 0.5).abs() < 1e-5 && (v - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn face_mapping_off_center() {
        let dir = face_uv_to_direction(3, 0.2, 0.7);
        let (f, u, v) = direction_to_face_uv(dir);
        assert_eq!(f, 3);
        assert!((u - 0.2).abs() < 1e-5 && (v - 0.7).abs() < 1e-5);
    }

    #[test]
    fn equirect_poles() {
        let (_, v_up) = direction_to_equirect_uv(Vec3::Y);
        let (_, v_down) = direction_to_equirect_uv(Vec3::NEG_Y);
        assert!(v_up.abs() < 1e-5);
        assert!((v_down - 1.0).abs() < 1e-5);
    }
}
