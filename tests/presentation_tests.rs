//! Presentation Controls Tests
//!
//! Tests for:
//! - Range clamping under out-of-range drags
//! - Snap-back to the initial orientation, with and without a snap config
//! - Zoom while dragged past half the polar range
//! - Global (surface) vs node capture
//! - Cursor affordance transitions
//! - Transform output

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::{EulerRot, Quat, Vec2, Vec3};
use parking_lot::Mutex;
use winit::event::{ElementState, MouseButton};
use winit::window::CursorIcon;

use myth_stage::animation::SpringConfig;
use myth_stage::app::PointerInput;
use myth_stage::controls::{PresentationControls, PresentationOptions, Snap};
use myth_stage::scene::Transform;

const EPSILON: f32 = 1e-3;
const DT: f32 = 1.0 / 60.0;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

// ============================================================================
// Pointer script
// ============================================================================

/// Drives one set of controls frame by frame.
struct Rig {
    controls: PresentationControls,
    input: PointerInput,
    transform: Transform,
}

impl Rig {
    fn new(options: PresentationOptions) -> Self {
        let mut input = PointerInput::new();
        input.handle_resize(800, 600);
        input.handle_cursor_move(400.0, 300.0);
        Self {
            controls: PresentationControls::new(options),
            input,
            transform: Transform::new(),
        }
    }

    fn frame(&mut self) {
        self.controls.update(&self.input, DT, &mut self.transform);
        self.input.end_frame();
    }

    fn hover(&mut self, hovered: bool) {
        self.input.set_hovered(hovered);
        self.frame();
    }

    fn press(&mut self) {
        self.input.handle_mouse_input(ElementState::Pressed, MouseButton::Left);
        self.frame();
    }

    fn drag_by(&mut self, dx: f32, dy: f32) {
        let p = self.input.cursor_position + Vec2::new(dx, dy);
        self.input.handle_cursor_move(f64::from(p.x), f64::from(p.y));
        self.frame();
    }

    fn release(&mut self) {
        self.input.handle_mouse_input(ElementState::Released, MouseButton::Left);
        self.frame();
    }

    fn settle(&mut self) {
        for _ in 0..600 {
            self.frame();
        }
    }
}

// ============================================================================
// Clamping
// ============================================================================

#[test]
fn orientation_stays_within_ranges_during_wild_drags() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        polar: [-0.3, 0.6],
        azimuth: [-0.5, 0.5],
        ..Default::default()
    });
    let [p0, p1] = rig.controls.effective_polar();
    let [a0, a1] = rig.controls.effective_azimuth();

    rig.press();
    for (dx, dy) in [(5000.0, 9000.0), (-20000.0, -3.0), (1.0, -40000.0), (700.0, 700.0)] {
        for _ in 0..10 {
            rig.drag_by(dx / 10.0, dy / 10.0);
            let target = rig.controls.rotation_target();
            let live = rig.controls.rotation();
            assert!((p0..=p1).contains(&target.x), "polar target {} escaped", target.x);
            assert!((a0..=a1).contains(&target.y), "azimuth target {} escaped", target.y);
            assert!((p0..=p1).contains(&live.x));
            assert!((a0..=a1).contains(&live.y));
        }
    }
    rig.release();
}

#[test]
fn ranges_are_relative_to_base_rotation() {
    let controls = PresentationControls::new(PresentationOptions {
        rotation: [0.2, 1.0, 0.0],
        polar: [-0.1, 0.1],
        azimuth: [-0.5, 0.25],
        ..Default::default()
    });
    let [p0, p1] = controls.effective_polar();
    let [a0, a1] = controls.effective_azimuth();
    assert!(approx(p0, 0.1) && approx(p1, 0.3));
    assert!(approx(a0, 0.5) && approx(a1, 1.25));
    assert!(vec3_approx(controls.initial_orientation(), Vec3::new(0.2, 1.0, 0.0)));
}

#[test]
fn horizontal_drag_maps_surface_width_to_pi_times_speed() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        speed: 2.0,
        ..Default::default()
    });
    rig.press();
    rig.drag_by(200.0, 0.0);
    // 200 / 800 * π * 2
    assert!(approx(rig.controls.rotation_target().y, PI / 2.0));
}

// ============================================================================
// Snap
// ============================================================================

#[test]
fn snap_returns_to_initial_orientation() {
    let options = PresentationOptions {
        global: true,
        snap: Snap::On,
        rotation: [0.1, 0.2, 0.0],
        ..Default::default()
    };
    let mut rig = Rig::new(options);
    let initial = rig.controls.initial_orientation();

    rig.press();
    rig.drag_by(150.0, 80.0);
    assert!(!vec3_approx(rig.controls.rotation_target(), initial));

    rig.release();
    assert!(vec3_approx(rig.controls.rotation_target(), initial));
    assert!(approx(rig.controls.scale_target(), 1.0));
    assert_eq!(rig.controls.rotation_config(), options.config);

    rig.settle();
    assert!(vec3_approx(rig.controls.rotation(), initial));
}

#[test]
fn without_snap_release_keeps_the_dragged_orientation() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        ..Default::default()
    });
    rig.press();
    rig.drag_by(100.0, 60.0);
    let dragged = rig.controls.rotation_target();
    rig.release();
    assert!(vec3_approx(rig.controls.rotation_target(), dragged));
}

#[test]
fn snap_config_overrides_drag_config_on_release() {
    let drag = SpringConfig::new(1.0, 170.0, 26.0);
    let snap = SpringConfig::new(4.0, 1500.0, 40.0);
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        snap: Snap::Config(snap),
        config: drag,
        ..Default::default()
    });

    rig.press();
    rig.drag_by(50.0, 50.0);
    assert_eq!(rig.controls.rotation_config(), drag);
    assert!(approx(rig.controls.scale_config().friction, drag.friction * 3.0));

    rig.release();
    assert_eq!(rig.controls.rotation_config(), snap);
    assert!(approx(rig.controls.scale_config().friction, snap.friction * 3.0));
    assert!(approx(rig.controls.scale_config().tension, snap.tension));
}

// ============================================================================
// Zoom
// ============================================================================

#[test]
fn zoom_applies_past_half_the_polar_range_while_down() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        zoom: 1.5,
        ..Default::default()
    });
    rig.press();
    rig.drag_by(0.0, 60.0);
    // 60 / 600 * π < π/4
    assert!(approx(rig.controls.scale_target(), 1.0));

    rig.drag_by(0.0, 300.0);
    assert!(rig.controls.rotation_target().x > FRAC_PI_2 / 2.0);
    assert!(approx(rig.controls.scale_target(), 1.5));

    rig.release();
    assert!(approx(rig.controls.scale_target(), 1.0));
}

// ============================================================================
// Capture
// ============================================================================

#[test]
fn global_capture_accepts_drags_from_outside_the_node() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        ..Default::default()
    });
    rig.input.set_hovered(false);

    rig.press();
    assert!(rig.controls.is_dragging());
    rig.drag_by(100.0, 0.0);
    assert!(rig.controls.rotation_target().y > 0.0);
}

#[test]
fn node_capture_ignores_drags_from_outside_the_node() {
    let mut rig = Rig::new(PresentationOptions::default());
    rig.input.set_hovered(false);

    rig.press();
    assert!(!rig.controls.is_dragging());
    rig.drag_by(100.0, 0.0);
    assert!(approx(rig.controls.rotation_target().y, 0.0));
    rig.release();

    rig.hover(true);
    rig.press();
    assert!(rig.controls.is_dragging());
    rig.drag_by(100.0, 0.0);
    assert!(rig.controls.rotation_target().y > 0.0);
}

#[test]
fn drag_continues_after_leaving_the_node() {
    let mut rig = Rig::new(PresentationOptions::default());
    rig.hover(true);
    rig.press();
    rig.input.set_hovered(false);
    rig.drag_by(80.0, 0.0);
    assert!(rig.controls.is_dragging());
    assert!(rig.controls.rotation_target().y > 0.0);
}

// ============================================================================
// Cursor
// ============================================================================

#[test]
fn cursor_follows_hover_and_drag() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let controls = PresentationControls::new(PresentationOptions::default())
        .with_cursor_callback(move |icon| sink.lock().push(icon));

    let mut rig = Rig::new(PresentationOptions::default());
    rig.controls = controls;
    assert_eq!(rig.controls.cursor(), CursorIcon::Default);

    rig.hover(true);
    rig.press();
    rig.drag_by(10.0, 0.0);
    rig.release();
    rig.hover(false);

    assert_eq!(
        *seen.lock(),
        vec![
            CursorIcon::Grab,
            CursorIcon::Grabbing,
            CursorIcon::Grab,
            CursorIcon::Default
        ]
    );
}

#[test]
fn global_mode_ignores_hover_for_cursor() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        ..Default::default()
    });
    rig.hover(true);
    rig.hover(false);
    assert_eq!(rig.controls.cursor(), CursorIcon::Grab);
}

// ============================================================================
// Options & output
// ============================================================================

#[test]
fn changing_the_base_rotation_retargets_the_spring() {
    let mut controls = PresentationControls::default();
    let mut options = *controls.options();

    options.speed = 3.0;
    controls.set_options(options);
    assert!(!controls.is_animating());

    options.rotation = [0.5, 0.5, 0.0];
    controls.set_options(options);
    assert!(controls.is_animating());
    assert!(vec3_approx(controls.rotation_target(), Vec3::new(0.5, 0.5, 0.0)));
}

#[test]
fn update_writes_euler_rotation_and_uniform_scale() {
    let mut rig = Rig::new(PresentationOptions {
        global: true,
        zoom: 2.0,
        ..Default::default()
    });
    rig.press();
    rig.drag_by(120.0, 400.0);
    rig.settle();

    let r = rig.controls.rotation();
    let expected = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
    assert!(rig.transform.rotation.abs_diff_eq(expected, EPSILON));
    assert!(vec3_approx(rig.transform.scale, Vec3::splat(rig.controls.scale())));
    assert!(approx(rig.controls.scale(), 2.0));
}

#[test]
fn options_load_from_json() {
    let options = PresentationOptions::from_json(
        r#"{ "global": true, "snap": { "mass": 4, "tension": 1500 }, "rotation": [0, 0.3, 0], "polar": [-0.4, 0.2] }"#,
    )
    .unwrap();
    assert!(options.global);
    assert_eq!(options.snap, Snap::Config(SpringConfig::new(4.0, 1500.0, 26.0)));
    assert!(approx(options.speed, 1.0));
    assert_eq!(options.azimuth, [f32::NEG_INFINITY, f32::INFINITY]);
}
