#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Scene staging helpers: image-based lighting environments with scoped
//! installation, and spring-animated drag-to-rotate presentation controls.

pub mod animation;
pub mod app;
pub mod assets;
pub mod controls;
pub mod environment;
pub mod errors;
pub mod ibl;
pub mod scene;

pub use animation::{SpringConfig, SpringValue};
pub use app::PointerInput;
pub use assets::{ColorSpace, EnvironmentMap, Readiness, SourceTexture, TextureDecoder};
pub use controls::{CaptureTarget, PresentationControls, PresentationOptions, Snap};
pub use environment::{
    Environment, EnvironmentConfig, EnvironmentHandle, EnvironmentLoader, EnvironmentProps,
    EnvironmentSource, Preset,
};
pub use errors::{Error, Result};
pub use ibl::{CpuIblBackend, IblBackend, PmremGenerator};
pub use scene::{Background, Scene, SceneTarget, Stage, Transform};
