//! Window-facing setup: camera, planet, starfield and the window hooks that
//! feed the lifecycle.

use bevy::asset::AssetLoadFailedEvent;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::post_process::bloom::Bloom;
use bevy::prelude::*;
use bevy::render::view::Hdr;
use bevy::window::{
    CursorIcon, PrimaryWindow, SystemCursorIcon, WindowOccluded, WindowResized,
};

use crate::camera::OrbitCamera;
use crate::config::GlobeConfig;
use crate::core_material::CoreMaterial;
use crate::error::GlobeError;
use crate::interaction::CursorFeedback;
use crate::lifecycle::{GlobeFailure, GlobeLifecycle, LifecycleRequests};
use crate::planet::{PlanetAssets, spawn_planet};
use crate::scene::GlobeScene;
use crate::star_material::StarMaterial;
use crate::starfield::spawn_starfield;
use crate::surface_material::SurfaceMaterial;

/// Marker for the globe's camera.
#[derive(Component, Debug, Clone, Copy)]
pub struct GlobeCamera;

/// Spawn the camera, planet layers and starfield.
///
/// Fails with [`GlobeError::MissingWindow`] when there is no primary window.
#[allow(clippy::too_many_arguments, clippy::needless_pass_by_value)]
pub fn spawn_globe_view(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<GlobeConfig>,
    mut scene: ResMut<GlobeScene>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut standard_materials: ResMut<Assets<StandardMaterial>>,
    mut surface_materials: ResMut<Assets<SurfaceMaterial>>,
    mut core_materials: ResMut<Assets<CoreMaterial>>,
    mut star_materials: ResMut<Assets<StarMaterial>>,
) -> Result {
    let Ok(window) = windows.single() else {
        tracing::error!("Globe view needs a primary window");
        return Err(GlobeError::MissingWindow.into());
    };

    let world_map: Handle<Image> = asset_server.load(config.planet.world_map_path.clone());
    spawn_planet(
        &mut commands,
        PlanetAssets {
            meshes: &mut meshes,
            standard_materials: &mut standard_materials,
            surface_materials: &mut surface_materials,
            core_materials: &mut core_materials,
        },
        &config.planet,
        world_map.clone(),
        scene.root,
    );

    let starfield = spawn_starfield(
        &mut commands,
        &mut meshes,
        &mut star_materials,
        &config.starfield,
    );

    let orbit = OrbitCamera::new(config.camera.distance);
    let camera = commands
        .spawn((
            Name::new("Globe camera"),
            GlobeCamera,
            Camera3d::default(),
            Camera {
                clear_color: bevy::camera::ClearColorConfig::Custom(Color::BLACK),
                ..default()
            },
            orbit.transform(),
            Projection::Perspective(PerspectiveProjection {
                fov: config.camera.fov_degrees.to_radians(),
                aspect_ratio: aspect_ratio(window.width(), window.height()).unwrap_or(1.0),
                near: 0.01,
                far: config.starfield.outer_radius * 4.0,
                ..default()
            }),
            // Bloom carries the core glow and the brightest stars.
            Tonemapping::TonyMcMapface,
            Hdr,
            Bloom::NATURAL,
            orbit,
        ))
        .id();

    scene.camera = Some(camera);
    scene.starfield = Some(starfield);
    scene.world_map = Some(world_map);

    tracing::info!(
        width = window.width(),
        height = window.height(),
        "Globe view ready"
    );
    Ok(())
}

/// Width over height, or `None` for a degenerate window.
pub fn aspect_ratio(width: f32, height: f32) -> Option<f32> {
    (width > 0.0 && height > 0.0).then(|| width / height)
}

/// Report a world-map load failure.
pub fn watch_world_map(
    mut failed: MessageReader<AssetLoadFailedEvent<Image>>,
    scene: Res<GlobeScene>,
    mut failures: MessageWriter<GlobeFailure>,
) {
    for event in failed.read() {
        if scene
            .world_map
            .as_ref()
            .is_some_and(|handle| handle.id() == event.id)
        {
            failures.write(GlobeFailure(GlobeError::TextureLoad {
                path: event.path.to_string(),
                message: event.error.to_string(),
            }));
        }
    }
}

/// Keep the camera's aspect ratio in step with the primary window.
pub fn sync_aspect_ratio(
    mut resized: MessageReader<WindowResized>,
    primary: Query<Entity, With<PrimaryWindow>>,
    mut projections: Query<&mut Projection, With<GlobeCamera>>,
) {
    let Ok(primary) = primary.single() else {
        return;
    };
    let Some(ratio) = resized
        .read()
        .filter(|event| event.window == primary)
        .last()
        .and_then(|event| aspect_ratio(event.width, event.height))
    else {
        return;
    };
    for mut projection in &mut projections {
        if let Projection::Perspective(perspective) = projection.as_mut()
            && perspective.aspect_ratio != ratio
        {
            perspective.aspect_ratio = ratio;
        }
    }
}

/// Pause while the window is hidden and resume when it comes back.
pub fn pause_when_occluded(
    mut occluded: MessageReader<WindowOccluded>,
    lifecycle: Res<GlobeLifecycle>,
    mut requests: ResMut<LifecycleRequests>,
) {
    let Some(event) = occluded.read().last() else {
        return;
    };
    if lifecycle.is_disposed() {
        return;
    }
    if event.occluded {
        tracing::debug!("Window occluded");
        requests.request_pause();
    } else {
        tracing::debug!("Window visible");
        requests.request_resume();
    }
}

/// Show a pointer cursor while a marker is hovered.
pub fn apply_cursor_feedback(
    mut commands: Commands,
    cursor: Res<CursorFeedback>,
    window: Query<Entity, With<PrimaryWindow>>,
) {
    if !cursor.is_changed() {
        return;
    }
    let Ok(window) = window.single() else {
        return;
    };
    let icon = match *cursor {
        CursorFeedback::Default => SystemCursorIcon::Default,
        CursorFeedback::Pointer => SystemCursorIcon::Pointer,
    };
    commands.entity(window).insert(CursorIcon::System(icon));
}
