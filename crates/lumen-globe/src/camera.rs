//! Damped orbit camera around the globe.
//!
//! Left-drag orbits, right-drag pans, the wheel zooms. Input moves the
//! target angles and distance; the camera eases towards them each frame.

use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::config::{CameraConfig, GlobeConfig};
use crate::interaction::GlobeInputGate;

/// Pitch limit, short of the poles.
const MAX_PITCH: f32 = 1.5;

/// Orbit state of the globe camera.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    /// Rotation around the world Y axis, in radians.
    pub yaw: f32,
    /// Elevation above the equator plane, in radians.
    pub pitch: f32,
    pub distance: f32,
    pub target_focus: Vec3,
    pub target_yaw: f32,
    pub target_pitch: f32,
    pub target_distance: f32,
}

impl OrbitCamera {
    /// Camera looking at the origin from `distance` along +Z.
    pub fn new(distance: f32) -> Self {
        Self {
            focus: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target_focus: Vec3::ZERO,
            target_yaw: 0.0,
            target_pitch: 0.0,
            target_distance: distance,
        }
    }

    /// Rotate the target by a pointer delta in pixels.
    pub fn orbit(&mut self, delta: Vec2, config: &CameraConfig) {
        self.target_yaw -= delta.x * config.orbit_sensitivity;
        self.target_pitch =
            (self.target_pitch + delta.y * config.orbit_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move the focus in the view plane by a pointer delta in pixels.
    ///
    /// Pan speed scales with distance so the globe tracks the pointer.
    pub fn pan(&mut self, delta: Vec2, config: &CameraConfig) {
        let rotation = self.rotation();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let scale = config.pan_sensitivity * self.target_distance;
        let focus = self.target_focus + (-delta.x * right + delta.y * up) * scale;
        self.target_focus = focus.clamp_length_max(config.max_pan);
    }

    /// Zoom by wheel lines. Positive values move closer.
    pub fn zoom(&mut self, lines: f32, config: &CameraConfig) {
        let factor = (1.0 - config.zoom_sensitivity).powf(lines);
        self.target_distance =
            (self.target_distance * factor).clamp(config.min_distance, config.max_distance);
    }

    /// Ease towards the targets over `dt` seconds.
    pub fn step(&mut self, dt: f32, damping: f32) {
        let t = 1.0 - (-damping * dt).exp();
        self.focus = self.focus.lerp(self.target_focus, t);
        self.yaw += (self.target_yaw - self.yaw) * t;
        self.pitch += (self.target_pitch - self.pitch) * t;
        self.distance += (self.target_distance - self.distance) * t;
    }

    fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0)
    }

    /// Camera transform for the current (damped) state.
    pub fn transform(&self) -> Transform {
        let rotation = self.rotation();
        let translation = self.focus + rotation * Vec3::new(0.0, 0.0, self.distance);
        Transform {
            translation,
            rotation,
            ..default()
        }
    }
}

/// Turn mouse input into orbit targets.
#[allow(clippy::needless_pass_by_value)]
pub fn orbit_camera_input(
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    buttons: Res<ButtonInput<MouseButton>>,
    gate: Res<GlobeInputGate>,
    config: Res<GlobeConfig>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }
    let mut lines = 0.0;
    for event in mouse_wheel.read() {
        // Web reports pixels, native reports lines.
        lines += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / 120.0,
        };
    }
    if gate.blocked {
        return;
    }

    let config = &config.camera;
    for mut camera in &mut cameras {
        if delta != Vec2::ZERO {
            if buttons.pressed(MouseButton::Left) {
                camera.orbit(delta, config);
            } else if buttons.pressed(MouseButton::Right) {
                camera.pan(delta, config);
            }
        }
        if lines != 0.0 {
            camera.zoom(lines, config);
        }
    }
}

/// Damp the orbit state and write the camera transform.
pub fn apply_orbit_camera(
    time: Res<Time>,
    config: Res<GlobeConfig>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    let dt = time.delta_secs();
    for (mut camera, mut transform) in &mut cameras {
        camera.step(dt, config.camera.damping);
        *transform = camera.transform();
    }
}
