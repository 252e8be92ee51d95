use glam::{EulerRot, Quat, Vec3};

/// Position, rotation and scale of the node the presentation controls drive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Sets the rotation from XYZ Euler angles (radians).
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_rotation_is_applied_in_xyz_order() {
        let mut t = Transform::new();
        t.set_rotation_euler(0.0, std::f32::consts::FRAC_PI_2, 0.0);

        let p = t.rotation * Vec3::X;
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5), "got {p:?}");
        assert_eq!(t.scale, Vec3::ONE);
    }
}
