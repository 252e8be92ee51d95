//! Presentation Controls
//!
//! Drag-to-rotate for a single object: the pointer turns the object within
//! polar / azimuth limits and springs it back on release when snapping is on.
//! The camera stays put; the controlled node's [`Transform`] is written
//! instead.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Deserializer};
use winit::window::CursorIcon;

use crate::animation::spring::{SpringConfig, SpringValue};
use crate::app::input::PointerInput;
use crate::scene::transform::Transform;

use super::gesture::{CaptureTarget, DragEvent, GestureHandler, GestureRecognizer, HoverEvent};

// ============================================================================
// Options
// ============================================================================

/// Snap-back behavior on release.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "SnapRepr")]
pub enum Snap {
    #[default]
    Off,
    /// Return to the initial orientation with the drag config.
    On,
    /// Return to the initial orientation with this config.
    Config(SpringConfig),
}

impl Snap {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Snap::Off)
    }
}

/// `true` / `false` or a spring config object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapRepr {
    Flag(bool),
    Config(SpringConfig),
}

impl From<SnapRepr> for Snap {
    fn from(repr: SnapRepr) -> Self {
        match repr {
            SnapRepr::Flag(false) => Snap::Off,
            SnapRepr::Flag(true) => Snap::On,
            SnapRepr::Config(config) => Snap::Config(config),
        }
    }
}

/// ```json
/// { "snap": { "mass": 4, "tension": 1500 }, "polar": [-0.4, 0.2], "azimuth": [null, null] }
/// ```
///
/// A `null` range bound means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PresentationOptions {
    pub snap: Snap,
    /// Accept drags anywhere on the surface, not only over the node.
    pub global: bool,
    pub speed: f32,
    /// Scale applied while dragged past half the polar range.
    pub zoom: f32,
    /// Base orientation `[polar, azimuth, roll]`; ranges are relative to it.
    pub rotation: [f32; 3],
    #[serde(deserialize_with = "deserialize_range")]
    pub polar: [f32; 2],
    #[serde(deserialize_with = "deserialize_range")]
    pub azimuth: [f32; 2],
    pub config: SpringConfig,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            snap: Snap::Off,
            global: false,
            speed: 1.0,
            zoom: 1.0,
            rotation: [0.0; 3],
            polar: [0.0, FRAC_PI_2],
            azimuth: [f32::NEG_INFINITY, f32::INFINITY],
            config: SpringConfig::default(),
        }
    }
}

fn deserialize_range<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[f32; 2], D::Error> {
    let [lo, hi] = <[Option<f32>; 2]>::deserialize(deserializer)?;
    Ok([lo.unwrap_or(f32::NEG_INFINITY), hi.unwrap_or(f32::INFINITY)])
}

impl PresentationOptions {
    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Polar limits offset by the base rotation.
    #[must_use]
    pub fn effective_polar(&self) -> [f32; 2] {
        let base = self.rotation[0];
        [base + self.polar[0], base + self.polar[1]]
    }

    /// Azimuth limits offset by the base rotation.
    #[must_use]
    pub fn effective_azimuth(&self) -> [f32; 2] {
        let base = self.rotation[1];
        [base + self.azimuth[0], base + self.azimuth[1]]
    }

    /// Base rotation clamped into the effective limits.
    #[must_use]
    pub fn initial_orientation(&self) -> Vec3 {
        Vec3::new(
            clamp_to(self.rotation[0], self.effective_polar()),
            clamp_to(self.rotation[1], self.effective_azimuth()),
            self.rotation[2],
        )
    }

    #[must_use]
    pub fn capture_target(&self) -> CaptureTarget {
        if self.global {
            CaptureTarget::Surface
        } else {
            CaptureTarget::Node
        }
    }
}

/// `max(lo, min(hi, value))`. Never panics on inverted or infinite bounds.
#[inline]
fn clamp_to(value: f32, [lo, hi]: [f32; 2]) -> f32 {
    lo.max(hi.min(value))
}

// ============================================================================
// Spring channels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Rotation,
    Scale,
}

/// One config for every channel, or a function choosing per channel.
#[derive(Clone)]
pub enum ChannelConfig {
    Uniform(SpringConfig),
    PerChannel(Arc<dyn Fn(Channel) -> SpringConfig + Send + Sync>),
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform(config) => f.debug_tuple("Uniform").field(config).finish(),
            Self::PerChannel(_) => f.write_str("PerChannel(..)"),
        }
    }
}

impl ChannelConfig {
    #[must_use]
    pub fn resolve(&self, channel: Channel) -> SpringConfig {
        match self {
            Self::Uniform(config) => *config,
            Self::PerChannel(select) => select(channel),
        }
    }

    /// `base` for rotation, `base` with tripled friction for scale.
    #[must_use]
    pub fn damped_scale(base: SpringConfig) -> Self {
        Self::PerChannel(Arc::new(move |channel| match channel {
            Channel::Rotation => base,
            Channel::Scale => base.with_friction_scaled(3.0),
        }))
    }
}

/// Target state for [`PresentationControls::animate`].
#[derive(Debug, Clone)]
pub struct SpringUpdate {
    pub rotation: Vec3,
    pub scale: f32,
    pub config: ChannelConfig,
}

// ============================================================================
// Controls
// ============================================================================

pub type CursorCallback = Box<dyn FnMut(CursorIcon) + Send>;

pub struct PresentationControls {
    options: PresentationOptions,
    polar: [f32; 2],
    azimuth: [f32; 2],
    initial: Vec3,

    rotation: SpringValue<Vec3>,
    scale: SpringValue<f32>,

    surface: Vec2,
    cursor: CursorIcon,
    on_cursor: Option<CursorCallback>,
    recognizer: GestureRecognizer<[f32; 2]>,
}

impl fmt::Debug for PresentationControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationControls")
            .field("options", &self.options)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Default for PresentationControls {
    fn default() -> Self {
        Self::new(PresentationOptions::default())
    }
}

impl PresentationControls {
    #[must_use]
    pub fn new(options: PresentationOptions) -> Self {
        let initial = options.initial_orientation();
        Self {
            polar: options.effective_polar(),
            azimuth: options.effective_azimuth(),
            initial,
            rotation: SpringValue::new(initial, options.config),
            scale: SpringValue::new(1.0, options.config),
            surface: Vec2::ONE,
            cursor: if options.global {
                CursorIcon::Grab
            } else {
                CursorIcon::Default
            },
            on_cursor: None,
            recognizer: GestureRecognizer::new(options.capture_target()),
            options,
        }
    }

    /// Called whenever the cursor affordance changes.
    #[must_use]
    pub fn with_cursor_callback(mut self, callback: impl FnMut(CursorIcon) + Send + 'static) -> Self {
        self.on_cursor = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn options(&self) -> &PresentationOptions {
        &self.options
    }

    /// Replaces the options. The spring is re-targeted only when the initial
    /// orientation moved.
    pub fn set_options(&mut self, options: PresentationOptions) {
        let initial = options.initial_orientation();
        self.polar = options.effective_polar();
        self.azimuth = options.effective_azimuth();
        self.recognizer.capture = options.capture_target();
        if options.global && !self.options.global {
            self.set_cursor(CursorIcon::Grab);
        }
        self.options = options;

        if initial != self.initial {
            self.initial = initial;
            self.animate(SpringUpdate {
                rotation: initial,
                scale: 1.0,
                config: ChannelConfig::Uniform(self.options.config),
            });
        }
    }

    #[must_use]
    pub fn effective_polar(&self) -> [f32; 2] {
        self.polar
    }

    #[must_use]
    pub fn effective_azimuth(&self) -> [f32; 2] {
        self.azimuth
    }

    #[must_use]
    pub fn initial_orientation(&self) -> Vec3 {
        self.initial
    }

    /// Current `[polar, azimuth, roll]`, kept inside the limits even while
    /// the spring overshoots.
    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        let r = self.rotation.get();
        Vec3::new(clamp_to(r.x, self.polar), clamp_to(r.y, self.azimuth), r.z)
    }

    #[must_use]
    pub fn rotation_target(&self) -> Vec3 {
        self.rotation.target()
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale.get()
    }

    #[must_use]
    pub fn scale_target(&self) -> f32 {
        self.scale.target()
    }

    /// Config the rotation channel currently animates with.
    #[must_use]
    pub fn rotation_config(&self) -> SpringConfig {
        self.rotation.config()
    }

    #[must_use]
    pub fn scale_config(&self) -> SpringConfig {
        self.scale.config()
    }

    #[must_use]
    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.recognizer.is_dragging()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.rotation.is_idle() || !self.scale.is_idle()
    }

    /// Surface size the drag deltas are normalized by, in pixels.
    pub fn set_surface_size(&mut self, size: Vec2) {
        self.surface = size.max(Vec2::ONE);
    }

    /// Starts both channels toward `update`.
    pub fn animate(&mut self, update: SpringUpdate) {
        self.rotation
            .start(update.rotation, update.config.resolve(Channel::Rotation));
        self.scale
            .start(update.scale, update.config.resolve(Channel::Scale));
    }

    /// Advances the springs by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> bool {
        let rotating = self.rotation.tick(dt);
        let scaling = self.scale.tick(dt);
        rotating || scaling
    }

    /// Writes the current orientation (Euler XYZ) and uniform scale.
    pub fn apply(&self, transform: &mut Transform) {
        let r = self.rotation();
        transform.set_rotation_euler(r.x, r.y, r.z);
        transform.scale = Vec3::splat(self.scale());
    }

    /// Per-frame driver: gestures, springs, transform.
    pub fn update(&mut self, input: &PointerInput, dt: f32, transform: &mut Transform) {
        if input.screen_size != Vec2::ZERO {
            self.set_surface_size(input.screen_size);
        }

        let mut recognizer = std::mem::take(&mut self.recognizer);
        recognizer.update(input, self);
        self.recognizer = recognizer;

        self.tick(dt);
        self.apply(transform);
    }

    fn set_cursor(&mut self, cursor: CursorIcon) {
        if self.cursor == cursor {
            return;
        }
        self.cursor = cursor;
        if let Some(callback) = self.on_cursor.as_mut() {
            callback(cursor);
        }
    }
}

impl GestureHandler<[f32; 2]> for PresentationControls {
    fn on_hover(&mut self, event: HoverEvent) {
        if self.options.global {
            return;
        }
        self.set_cursor(if event.last {
            CursorIcon::Default
        } else {
            CursorIcon::Grab
        });
    }

    fn on_drag(&mut self, event: DragEvent<[f32; 2]>) -> [f32; 2] {
        self.set_cursor(if event.down {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Grab
        });

        let [old_y, old_x] = event.memo.unwrap_or_else(|| {
            let target = self.rotation.target();
            [target.x, target.y]
        });

        let speed = PI * self.options.speed;
        let x = clamp_to(old_x + event.delta.x / self.surface.x * speed, self.azimuth);
        let y = clamp_to(old_y + event.delta.y / self.surface.y * speed, self.polar);

        let snapping = self.options.snap.is_enabled() && !event.down;
        let config = match self.options.snap {
            Snap::Config(snap_config) if !event.down => snap_config,
            _ => self.options.config,
        };

        self.animate(SpringUpdate {
            rotation: if snapping {
                self.initial
            } else {
                Vec3::new(y, x, 0.0)
            },
            scale: if event.down && y > self.polar[1] / 2.0 {
                self.options.zoom
            } else {
                1.0
            },
            config: ChannelConfig::damped_scale(config),
        });

        [y, x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_orientation_is_clamped_into_limits() {
        let options = PresentationOptions {
            rotation: [0.3, 0.0, 0.1],
            polar: [0.0, 0.5],
            azimuth: [-0.2, 0.2],
            ..Default::default()
        };
        assert_eq!(options.effective_polar(), [0.3, 0.8]);
        assert_eq!(options.initial_orientation(), Vec3::new(0.3, 0.0, 0.1));
    }

    #[test]
    fn clamp_to_tolerates_inverted_bounds() {
        assert!((clamp_to(5.0, [1.0, -1.0]) - 1.0).abs() < f32::EPSILON);
        assert!((clamp_to(5.0, [f32::NEG_INFINITY, f32::INFINITY]) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn snap_accepts_bool_or_config() {
        let on: PresentationOptions = serde_json::from_str(r#"{ "snap": true }"#).unwrap();
        assert_eq!(on.snap, Snap::On);
        let cfg: PresentationOptions =
            serde_json::from_str(r#"{ "snap": { "mass": 4, "tension": 1500 } }"#).unwrap();
        assert_eq!(cfg.snap, Snap::Config(SpringConfig::new(4.0, 1500.0, 26.0)));
    }

    #[test]
    fn null_bounds_are_unbounded() {
        let options: PresentationOptions =
            serde_json::from_str(r#"{ "azimuth": [null, 1.0] }"#).unwrap();
        assert_eq!(options.azimuth, [f32::NEG_INFINITY, 1.0]);
    }

    #[test]
    fn global_mode_starts_with_grab_cursor() {
        let controls = PresentationControls::new(PresentationOptions {
            global: true,
            ..Default::default()
        });
        assert_eq!(controls.cursor(), CursorIcon::Grab);
    }
}
