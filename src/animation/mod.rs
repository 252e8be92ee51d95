pub mod spring;

pub use spring::{presets, Animatable, SpringConfig, SpringValue};
