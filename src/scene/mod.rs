//! Scene Data
//!
//! The slice of the scene graph the staging helpers touch:
//! - [`Scene`]: background and environment slots
//! - [`Stage`]: owner of the active scene
//! - [`Transform`]: TRS component driven by the presentation controls
//! - [`Background`]: what is drawn behind the content

pub mod background;
pub mod scene;
pub mod transform;

pub use background::Background;
pub use scene::{Scene, SceneSlots, SceneTarget, SharedScene, Stage};
pub use transform::Transform;
