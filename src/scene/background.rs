//! Background Mode
//!
//! [`Background`] describes *what* a scene draws behind its content: a solid
//! color or an environment map used as a skybox.

use std::sync::Arc;

use glam::Vec4;

use crate::assets::texture::EnvironmentMap;

#[derive(Clone, Debug)]
pub enum Background {
    /// Solid color clear.
    Color(Vec4),

    /// Environment map drawn as a skybox.
    Map(Arc<EnvironmentMap>),
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(Vec4::new(0.0, 0.0, 0.0, 1.0))
    }
}

/// Maps compare by identity, colors by value.
impl PartialEq for Background {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Color(a), Self::Color(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
