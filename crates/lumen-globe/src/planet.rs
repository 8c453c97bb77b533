//! Planet layers: wireframe shell, shaded point surface and glowing core.
//!
//! All three are children of the globe root, so rotating the root turns
//! them together with the markers.

use std::f32::consts::{PI, TAU};

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::config::PlanetConfig;
use crate::coords::{equirect_uv, position_to_lat_lng};
use crate::core_material::{CoreMaterial, CoreParams, PlanetCore};
use crate::point_sprite::{SpritePoint, build_sprite_mesh};
use crate::surface_material::{SurfaceMaterial, SurfaceParams};

/// Marker for the wireframe shell.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlanetWireframe;

/// Marker for the point-cloud surface.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlanetSurface;

/// Shell slightly outside the surface points so lines are not hidden by them.
const WIREFRAME_SCALE: f32 = 1.002;

// ============================================================================
// Geometry
// ============================================================================

/// Evenly distributed unit vectors on a Fibonacci spiral.
#[allow(clippy::cast_precision_loss)]
pub fn fibonacci_sphere(count: usize) -> Vec<Vec3> {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            Vec3::new(r * theta.cos(), y, r * theta.sin())
        })
        .collect()
}

/// Surface point cloud whose payload is each point's world-map UV.
pub fn build_surface_mesh(count: usize, radius: f32) -> Mesh {
    let points: Vec<SpritePoint> = fibonacci_sphere(count)
        .into_iter()
        .map(|direction| {
            let (lat, lng) = position_to_lat_lng(direction);
            SpritePoint {
                center: direction * radius,
                payload: equirect_uv(lat, lng),
                color: [1.0; 4],
            }
        })
        .collect();
    build_sprite_mesh(&points)
}

/// Latitude/longitude grid as a line list.
///
/// `parallels` circles are spaced evenly between the poles (which are not
/// drawn); `meridians` half-circles run pole to pole.
#[allow(clippy::cast_precision_loss)]
pub fn build_graticule_mesh(radius: f32, parallels: u32, meridians: u32, segments: u32) -> Mesh {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let mut push_strip = |points: &mut dyn Iterator<Item = Vec3>, closed: bool| {
        let start = positions.len() as u32;
        positions.extend(points.map(|p| (p * radius).to_array()));
        let end = positions.len() as u32;
        if end - start < 2 {
            return;
        }
        for i in start..end - 1 {
            indices.extend([i, i + 1]);
        }
        if closed {
            indices.extend([end - 1, start]);
        }
    };

    for p in 1..=parallels {
        let polar = PI * p as f32 / (parallels + 1) as f32;
        let (sin_polar, cos_polar) = polar.sin_cos();
        let mut ring = (0..segments).map(|s| {
            let azimuth = TAU * s as f32 / segments as f32;
            Vec3::new(sin_polar * azimuth.cos(), cos_polar, sin_polar * azimuth.sin())
        });
        push_strip(&mut ring, true);
    }

    let half = (segments / 2).max(2);
    for m in 0..meridians {
        let azimuth = TAU * m as f32 / meridians as f32;
        let (sin_az, cos_az) = azimuth.sin_cos();
        let mut arc = (0..=half).map(|s| {
            let polar = PI * s as f32 / half as f32;
            Vec3::new(polar.sin() * cos_az, polar.cos(), polar.sin() * sin_az)
        });
        push_strip(&mut arc, false);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

// ============================================================================
// Spawning
// ============================================================================

/// Asset stores needed to build the planet.
pub struct PlanetAssets<'a> {
    pub meshes: &'a mut Assets<Mesh>,
    pub standard_materials: &'a mut Assets<StandardMaterial>,
    pub surface_materials: &'a mut Assets<SurfaceMaterial>,
    pub core_materials: &'a mut Assets<CoreMaterial>,
}

/// Spawn the three planet layers under `parent`.
pub fn spawn_planet(
    commands: &mut Commands,
    assets: PlanetAssets<'_>,
    config: &PlanetConfig,
    world_map: Handle<Image>,
    parent: Entity,
) {
    let wireframe = commands
        .spawn((
            Name::new("Planet wireframe"),
            PlanetWireframe,
            Mesh3d(assets.meshes.add(build_graticule_mesh(
                config.radius * WIREFRAME_SCALE,
                config.graticule_parallels,
                config.graticule_meridians,
                config.graticule_segments,
            ))),
            MeshMaterial3d(assets.standard_materials.add(StandardMaterial {
                base_color: config.wireframe_color,
                unlit: true,
                alpha_mode: AlphaMode::Blend,
                ..default()
            })),
            Transform::default(),
        ))
        .id();

    let surface = commands
        .spawn((
            Name::new("Planet surface"),
            PlanetSurface,
            Mesh3d(
                assets
                    .meshes
                    .add(build_surface_mesh(config.surface_points, config.radius)),
            ),
            MeshMaterial3d(assets.surface_materials.add(SurfaceMaterial {
                params: SurfaceParams::from_config(config),
                world_map,
            })),
            Transform::default(),
        ))
        .id();

    let core = commands
        .spawn((
            Name::new("Planet core"),
            PlanetCore,
            Mesh3d(
                assets.meshes.add(
                    Sphere::new(config.radius * config.core_radius_fraction)
                        .mesh()
                        .uv(48, 24),
                ),
            ),
            MeshMaterial3d(assets.core_materials.add(CoreMaterial {
                params: CoreParams::from_config(config),
            })),
            Transform::default(),
        ))
        .id();

    commands
        .entity(parent)
        .add_children(&[wireframe, surface, core]);

    tracing::info!(
        surface_points = config.surface_points,
        "Spawned planet layers"
    );
}
