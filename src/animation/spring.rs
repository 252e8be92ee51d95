//! Spring Animation
//!
//! Physically based interpolation: a value is pulled toward its target by a
//! damped spring instead of following a fixed-duration curve.
//!
//! Integration uses semi-implicit Euler in fixed 1 ms sub-steps, so the
//! motion does not depend on the frame rate:
//!
//! ```text
//! a = (-tension * (x - target) - friction * v) / mass
//! v += a * h
//! x += v * h
//! ```

use std::ops::{Add, Mul, Sub};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

const STEP_SECONDS: f32 = 0.001;
/// Upper bound on sub-steps per tick, so a long stall cannot freeze a frame.
const MAX_STEPS: u32 = 1000;
const REST_PRECISION: f32 = 1e-4;
const REST_VELOCITY: f32 = 1e-3;

/// Mass / tension / friction triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub mass: f32,
    pub tension: f32,
    pub friction: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            tension: 170.0,
            friction: 26.0,
        }
    }
}

impl SpringConfig {
    #[must_use]
    pub const fn new(mass: f32, tension: f32, friction: f32) -> Self {
        Self {
            mass,
            tension,
            friction,
        }
    }

    /// Copy with friction multiplied by `factor`.
    #[must_use]
    pub fn with_friction_scaled(self, factor: f32) -> Self {
        Self {
            friction: self.friction * factor,
            ..self
        }
    }
}

/// Common configurations.
pub mod presets {
    use super::SpringConfig;

    pub const DEFAULT: SpringConfig = SpringConfig::new(1.0, 170.0, 26.0);
    pub const GENTLE: SpringConfig = SpringConfig::new(1.0, 120.0, 14.0);
    pub const WOBBLY: SpringConfig = SpringConfig::new(1.0, 180.0, 12.0);
    pub const STIFF: SpringConfig = SpringConfig::new(1.0, 210.0, 20.0);
    pub const SLOW: SpringConfig = SpringConfig::new(1.0, 280.0, 60.0);
    pub const MOLASSES: SpringConfig = SpringConfig::new(1.0, 280.0, 120.0);
}

/// Values a spring can drive.
pub trait Animatable:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    const ZERO: Self;

    /// Largest absolute component, used for rest detection.
    fn max_abs(self) -> f32;
}

impl Animatable for f32 {
    const ZERO: Self = 0.0;

    fn max_abs(self) -> f32 {
        self.abs()
    }
}

impl Animatable for Vec2 {
    const ZERO: Self = Vec2::ZERO;

    fn max_abs(self) -> f32 {
        self.abs().max_element()
    }
}

impl Animatable for Vec3 {
    const ZERO: Self = Vec3::ZERO;

    fn max_abs(self) -> f32 {
        self.abs().max_element()
    }
}

/// A value animated toward a target.
#[derive(Debug, Clone, Copy)]
pub struct SpringValue<T: Animatable> {
    current: T,
    target: T,
    velocity: T,
    config: SpringConfig,
    idle: bool,
}

impl<T: Animatable> SpringValue<T> {
    #[must_use]
    pub fn new(value: T, config: SpringConfig) -> Self {
        Self {
            current: value,
            target: value,
            velocity: T::ZERO,
            config,
            idle: true,
        }
    }

    /// Retargets the spring. Velocity is preserved.
    pub fn start(&mut self, target: T, config: SpringConfig) {
        self.target = target;
        self.config = config;
        self.idle = false;
    }

    /// Jumps to `value` and stops.
    pub fn set(&mut self, value: T) {
        self.current = value;
        self.target = value;
        self.velocity = T::ZERO;
        self.idle = true;
    }

    /// Advances the simulation by `dt` seconds. Returns `true` while moving.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.idle {
            return false;
        }

        let SpringConfig {
            mass,
            tension,
            friction,
        } = self.config;
        let mass = mass.max(f32::EPSILON);
        let steps = ((dt.max(0.0) / STEP_SECONDS).ceil() as u32).min(MAX_STEPS);

        for _ in 0..steps {
            if self.velocity.max_abs() < REST_VELOCITY
                && (self.current - self.target).max_abs() <= REST_PRECISION
            {
                self.current = self.target;
                self.velocity = T::ZERO;
                self.idle = true;
                return false;
            }

            let spring_force = (self.current - self.target) * -tension;
            let damping_force = self.velocity * -friction;
            let acceleration = (spring_force + damping_force) * (1.0 / mass);
            self.velocity = self.velocity + acceleration * STEP_SECONDS;
            self.current = self.current + self.velocity * STEP_SECONDS;
        }
        true
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> T {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> T {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self) -> T {
        self.velocity
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> SpringConfig {
        self.config
    }

    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_on_target() {
        let mut spring = SpringValue::new(0.0_f32, SpringConfig::default());
        spring.start(1.0, SpringConfig::default());
        for _ in 0..300 {
            spring.tick(1.0 / 60.0);
        }
        assert!(spring.is_idle());
        assert!((spring.get() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn higher_friction_moves_slower() {
        let mut loose = SpringValue::new(Vec3::ZERO, presets::DEFAULT);
        let mut stiff = SpringValue::new(Vec3::ZERO, presets::DEFAULT);
        loose.start(Vec3::X, presets::DEFAULT);
        stiff.start(Vec3::X, presets::DEFAULT.with_friction_scaled(3.0));
        loose.tick(0.1);
        stiff.tick(0.1);
        assert!(stiff.get().x < loose.get().x);
    }

    #[test]
    fn idle_spring_does_not_move() {
        let mut spring = SpringValue::new(2.0_f32, SpringConfig::default());
        assert!(!spring.tick(1.0));
        assert!((spring.get() - 2.0).abs() < f32::EPSILON);
    }
}
