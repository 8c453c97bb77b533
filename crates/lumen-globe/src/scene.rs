//! Scene graph roots shared by the globe systems.

use bevy::prelude::*;

use crate::config::GlobeConfig;

/// Rotating planet group. Parent of the planet layers and the marker group.
#[derive(Component, Debug, Clone, Copy)]
pub struct GlobeRoot;

/// Parent of every event marker.
#[derive(Component, Debug, Clone, Copy)]
pub struct MarkerGroup;

/// Entities and assets owned by the globe.
#[derive(Resource, Debug, Clone)]
pub struct GlobeScene {
    pub root: Entity,
    pub marker_group: Entity,
    /// Orbit camera, once the view has been spawned.
    pub camera: Option<Entity>,
    pub starfield: Option<Entity>,
    pub world_map: Option<Handle<Image>>,
}

/// Spawn the globe root and marker group.
pub fn spawn_scene_root(mut commands: Commands) {
    let root = commands
        .spawn((
            Name::new("Globe"),
            GlobeRoot,
            Transform::default(),
            Visibility::default(),
        ))
        .id();
    let marker_group = commands
        .spawn((
            Name::new("Event markers"),
            MarkerGroup,
            Transform::default(),
            Visibility::default(),
            ChildOf(root),
        ))
        .id();

    commands.insert_resource(GlobeScene {
        root,
        marker_group,
        camera: None,
        starfield: None,
        world_map: None,
    });
}

/// Turn the planet group by its angular speed for this frame.
pub fn rotate_globe(
    time: Res<Time>,
    config: Res<GlobeConfig>,
    mut roots: Query<&mut Transform, With<GlobeRoot>>,
) {
    let angle = config.planet.rotation_speed * time.delta_secs();
    if angle == 0.0 {
        return;
    }
    for mut transform in &mut roots {
        transform.rotate_y(angle);
    }
}
