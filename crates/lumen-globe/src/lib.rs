//! Interactive globe of live prayer events for Bevy.
//!
//! The globe is a slowly rotating point-cloud planet with a glowing core, a
//! lat/long wireframe and a starfield behind it. Event records become
//! pulsing markers on the surface; hovering and clicking them is reported
//! to registered listeners.
//!
//! # Usage
//!
//! ```ignore
//! use bevy::prelude::*;
//! use lumen_globe::{GlobeConfig, GlobeEventKind, GlobeListeners, GlobeMarkers, GlobePlugin};
//!
//! fn main() -> lumen_globe::Result<()> {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(GlobePlugin::new(GlobeConfig::default())?)
//!         .add_systems(Startup, |mut listeners: ResMut<GlobeListeners>| {
//!             listeners.add_listener(GlobeEventKind::MarkerClick, |record| {
//!                 tracing::info!(id = %record.id, "Clicked");
//!             });
//!         })
//!         .run();
//!     Ok(())
//! }
//! ```
//!
//! # Frame order
//!
//! Each frame runs [`GlobeSystems`] in order: window hooks, lifecycle
//! requests, pointer input, then the per-frame work in [`GlobeFrame`]. Input
//! and frame work only run while the globe is running.

pub mod bridge;
pub mod camera;
pub mod config;
pub mod coords;
pub mod core_material;
pub mod error;
pub mod interaction;
pub mod lifecycle;
pub mod listeners;
pub mod markers;
pub mod planet;
pub mod point_sprite;
pub mod record;
pub mod scene;
pub mod shading;
pub mod star;
pub mod star_material;
pub mod starfield;
pub mod surface_material;
pub mod view;

use bevy::prelude::*;

pub use camera::OrbitCamera;
pub use config::{CameraConfig, GlobeConfig, MarkerConfig, PlanetConfig};
pub use error::{GlobeError, InvalidRecord, Result};
pub use interaction::{CursorFeedback, GlobeEvent, GlobeInputGate, GlobePointer, HoverState};
pub use lifecycle::{
    GlobeFailure, GlobeFrameStats, GlobeLifecycle, LifecycleRequests, LifecycleState,
};
pub use listeners::{GlobeEventKind, GlobeListeners, ListenerId};
pub use markers::{EventMarker, GlobeMarkers, MarkerRegistry, MarkerTier};
pub use record::EventRecord;
pub use scene::GlobeScene;
pub use starfield::StarfieldConfig;

/// Top-level ordering of globe systems within `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobeSystems {
    /// Window messages that feed pointer input and lifecycle requests.
    Window,
    /// Apply pause, resume and dispose requests.
    Lifecycle,
    /// Hover and click handling.
    Input,
    /// Per-frame animation, see [`GlobeFrame`].
    Frame,
}

/// Per-frame work, in order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobeFrame {
    Rotate,
    CoreUniform,
    MarkerPulse,
    Controls,
    Present,
}

/// Globe with rendering, window input and camera controls.
pub struct GlobePlugin {
    config: GlobeConfig,
}

impl GlobePlugin {
    /// Validate `config` and build the plugin.
    pub fn new(config: GlobeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Default for GlobePlugin {
    fn default() -> Self {
        Self {
            config: GlobeConfig::default(),
        }
    }
}

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .add_plugins((GlobeCorePlugin, GlobeRenderPlugin));
    }
}

/// Scene graph, markers, interaction and lifecycle without any rendering.
///
/// Uses the [`GlobeConfig`] resource if one is already present.
pub struct GlobeCorePlugin;

impl Plugin for GlobeCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeConfig>()
            .init_resource::<MarkerRegistry>()
            .init_resource::<HoverState>()
            .init_resource::<CursorFeedback>()
            .init_resource::<GlobeInputGate>()
            .init_resource::<GlobeListeners>()
            .init_resource::<GlobeLifecycle>()
            .init_resource::<LifecycleRequests>()
            .init_resource::<GlobeFrameStats>()
            .add_message::<GlobePointer>()
            .add_message::<GlobeEvent>()
            .add_message::<GlobeFailure>()
            .configure_sets(
                Update,
                (
                    GlobeSystems::Window,
                    GlobeSystems::Lifecycle,
                    GlobeSystems::Input,
                    GlobeSystems::Frame,
                )
                    .chain(),
            )
            .configure_sets(Update, GlobeSystems::Input.run_if(lifecycle::globe_running))
            .configure_sets(Update, GlobeSystems::Frame.run_if(lifecycle::globe_running))
            .configure_sets(
                Update,
                (
                    GlobeFrame::Rotate,
                    GlobeFrame::CoreUniform,
                    GlobeFrame::MarkerPulse,
                    GlobeFrame::Controls,
                    GlobeFrame::Present,
                )
                    .chain()
                    .in_set(GlobeSystems::Frame),
            )
            .add_systems(PreStartup, scene::spawn_scene_root)
            .add_systems(PostStartup, lifecycle::start_globe)
            .add_systems(
                Update,
                (
                    (
                        lifecycle::dispose_on_failure,
                        lifecycle::process_lifecycle_requests,
                    )
                        .chain()
                        .in_set(GlobeSystems::Lifecycle),
                    interaction::handle_pointer.in_set(GlobeSystems::Input),
                    scene::rotate_globe.in_set(GlobeFrame::Rotate),
                    markers::pulse_markers.in_set(GlobeFrame::MarkerPulse),
                    lifecycle::count_frame.in_set(GlobeFrame::Present),
                ),
            );
    }
}

/// Materials, camera, starfield and window hooks. Requires [`GlobeCorePlugin`].
pub struct GlobeRenderPlugin;

impl Plugin for GlobeRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            star_material::StarMaterialPlugin,
            surface_material::SurfaceMaterialPlugin,
            core_material::CoreMaterialPlugin,
        ))
        .add_systems(Startup, view::spawn_globe_view)
        .add_systems(
            Update,
            (
                (
                    view::watch_world_map,
                    view::pause_when_occluded,
                    view::sync_aspect_ratio,
                    bridge::bridge_window_pointer
                        .run_if(|lifecycle: Res<GlobeLifecycle>| !lifecycle.is_disposed()),
                )
                    .in_set(GlobeSystems::Window),
                surface_material::sync_world_map_texel_size,
                starfield::rotate_starfield.in_set(GlobeFrame::Rotate),
                core_material::update_core_time.in_set(GlobeFrame::CoreUniform),
                (camera::orbit_camera_input, camera::apply_orbit_camera)
                    .chain()
                    .in_set(GlobeFrame::Controls),
            ),
        )
        .add_systems(PostUpdate, view::apply_cursor_feedback);
    }
}

/// Headless app with the core plugin, past startup.
#[cfg(test)]
pub(crate) fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        AssetPlugin::default(),
        bevy::transform::TransformPlugin,
    ))
    .init_asset::<Mesh>()
    .init_asset::<StandardMaterial>()
    .init_asset::<Image>();

    let mut config = GlobeConfig::default();
    config.planet.rotation_speed = 0.0;
    app.insert_resource(config).add_plugins(GlobeCorePlugin);
    app.update();
    app
}
