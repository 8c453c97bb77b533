//! Procedural background starfield.
//!
//! Stars are placed between two concentric shells around the globe. A
//! fraction of them is pulled towards a few random directions, which gives
//! the field the uneven density of a galactic band. The cloud is generated
//! once from a seed and only rotated afterwards.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::point_sprite::{SpritePoint, build_sprite_mesh};
use crate::star::{StarClass, star_color, star_size};
use crate::star_material::StarMaterial;

/// Parameters for a generated starfield.
#[derive(Debug, Clone, PartialEq)]
pub struct StarfieldConfig {
    pub num_stars: usize,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Fraction of stars biased towards a cluster direction.
    pub cluster_fraction: f32,
    pub cluster_count: usize,
    /// Maximum angular offset from a cluster direction, as a unit-vector length.
    pub cluster_spread: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Whole-cloud rotation around +Y, in radians per second.
    pub rotation_speed: f32,
    pub seed: u64,
}

impl StarfieldConfig {
    /// Dense field used behind the main globe.
    pub fn primary() -> Self {
        Self {
            num_stars: 10_000,
            inner_radius: 20.0,
            outer_radius: 60.0,
            cluster_fraction: 0.35,
            cluster_count: 5,
            cluster_spread: 0.35,
            min_size: 0.04,
            max_size: 0.22,
            rotation_speed: 0.004,
            seed: 0x5EED_57A2,
        }
    }

    /// Sparse field for decorative backgrounds.
    pub fn decorative() -> Self {
        Self {
            num_stars: 600,
            inner_radius: 25.0,
            outer_radius: 45.0,
            cluster_fraction: 0.0,
            cluster_count: 0,
            cluster_spread: 0.0,
            min_size: 0.06,
            max_size: 0.18,
            rotation_speed: 0.002,
            seed: 0x5EED_57A2,
        }
    }
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self::primary()
    }
}

/// A generated star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub size: f32,
    pub color: Color,
    pub class: StarClass,
}

/// Marker for the starfield entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct Starfield {
    /// Angular speed around +Y, in radians per second.
    pub rotation_speed: f32,
}

/// Generate a deterministic set of stars.
pub fn generate_stars(config: &StarfieldConfig) -> Vec<Star> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let clusters: Vec<Vec3> = (0..config.cluster_count)
        .map(|_| random_direction(&mut rng))
        .collect();

    let inner3 = config.inner_radius.powi(3);
    let outer3 = config.outer_radius.powi(3);

    (0..config.num_stars)
        .map(|_| {
            let clustered = !clusters.is_empty() && rng.random::<f32>() < config.cluster_fraction;
            let direction = if clustered {
                let center = clusters[rng.random_range(0..clusters.len())];
                let jitter = random_direction(&mut rng);
                let offset = jitter * config.cluster_spread * rng.random::<f32>();
                (center + offset).normalize_or(center)
            } else {
                random_direction(&mut rng)
            };

            // Uniform in volume between the shells.
            let radius = (inner3 + (outer3 - inner3) * rng.random::<f32>()).cbrt();

            let class = StarClass::sample(&mut rng);
            Star {
                position: direction * radius,
                size: star_size(class, config.min_size, config.max_size, &mut rng),
                color: star_color(class, &mut rng),
                class,
            }
        })
        .collect()
}

/// Build the point-sprite mesh for a set of stars.
pub fn build_starfield_mesh(stars: &[Star]) -> Mesh {
    let points: Vec<SpritePoint> = stars
        .iter()
        .map(|star| SpritePoint {
            center: star.position,
            payload: Vec2::new(star.size, 0.0),
            color: LinearRgba::from(star.color).to_f32_array(),
        })
        .collect();
    build_sprite_mesh(&points)
}

/// Spawn a starfield entity. Empty fields are spawned hidden.
pub fn spawn_starfield(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StarMaterial>,
    config: &StarfieldConfig,
) -> Entity {
    let stars = generate_stars(config);
    let visibility = if stars.is_empty() {
        Visibility::Hidden
    } else {
        Visibility::Inherited
    };
    tracing::info!(
        stars = stars.len(),
        seed = config.seed,
        "Generated starfield"
    );

    commands
        .spawn((
            Name::new("Starfield"),
            Starfield {
                rotation_speed: config.rotation_speed,
            },
            Mesh3d(meshes.add(build_starfield_mesh(&stars))),
            MeshMaterial3d(materials.add(StarMaterial::default())),
            Transform::default(),
            visibility,
        ))
        .id()
}

/// Apply the slow whole-cloud rotation.
pub fn rotate_starfield(time: Res<Time>, mut query: Query<(&Starfield, &mut Transform)>) {
    for (starfield, mut transform) in &mut query {
        transform.rotate_y(starfield.rotation_speed * time.delta_secs());
    }
}

fn random_direction<R: Rng>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}
