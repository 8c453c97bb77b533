//! Tunable parameters for the globe.
//!
//! All distances are in scene units where the planet radius defaults to 1.

use bevy::prelude::*;

use crate::error::{GlobeError, Result};
use crate::starfield::StarfieldConfig;

// ============================================================================
// Planet
// ============================================================================

/// Planet geometry, shading and rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetConfig {
    /// Nominal planet radius.
    pub radius: f32,
    /// Angular speed of the planet group around +Y, in radians per second.
    pub rotation_speed: f32,
    /// Asset path of the equirectangular world map. Land is read from red.
    pub world_map_path: String,
    /// Number of points in the shaded surface cloud.
    pub surface_points: usize,
    /// Screen-facing size of each surface point, in scene units.
    pub surface_point_size: f32,
    /// Red-channel value above which a texel counts as land.
    pub land_threshold: f32,
    pub land_color: Color,
    pub ocean_color: Color,
    /// Fraction of ocean brightness removed.
    pub ocean_darkening: f32,
    pub edge_color: Color,
    /// Weight of the continent edge highlight.
    pub edge_strength: f32,
    /// How much the map darkens away from its centre.
    pub center_glow_strength: f32,
    /// Width of the alpha fade at the silhouette, in `dot(view, normal)` units.
    pub silhouette_fade: f32,
    /// Number of parallels in the wireframe shell (excluding the poles).
    pub graticule_parallels: u32,
    /// Number of meridians in the wireframe shell.
    pub graticule_meridians: u32,
    /// Line segments per full circle of the wireframe shell.
    pub graticule_segments: u32,
    pub wireframe_color: Color,
    /// Inner core radius as a fraction of the planet radius.
    pub core_radius_fraction: f32,
    pub core_color: Color,
    pub core_glow_strength: f32,
    pub core_rim_power: f32,
    pub core_rim_strength: f32,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            rotation_speed: 0.05,
            world_map_path: "textures/world_map.png".to_string(),
            surface_points: 24_000,
            surface_point_size: 0.0075,
            land_threshold: 0.5,
            land_color: Color::srgb(0.55, 0.78, 1.0),
            ocean_color: Color::srgb(0.08, 0.16, 0.35),
            ocean_darkening: 0.45,
            edge_color: Color::srgb(0.95, 0.98, 1.0),
            edge_strength: 0.8,
            center_glow_strength: 0.55,
            silhouette_fade: 0.3,
            graticule_parallels: 8,
            graticule_meridians: 16,
            graticule_segments: 72,
            wireframe_color: Color::srgba(0.35, 0.55, 0.9, 0.12),
            core_radius_fraction: 0.96,
            core_color: Color::srgb(0.3, 0.55, 1.0),
            core_glow_strength: 0.35,
            core_rim_power: 3.0,
            core_rim_strength: 0.6,
        }
    }
}

// ============================================================================
// Markers
// ============================================================================

/// Marker placement, sizing, colour tiers and animation.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerConfig {
    /// Height above the planet surface, keeps markers out of the surface cloud.
    pub altitude: f32,
    /// Size of a priority-0 marker before clamping.
    pub base_size: f32,
    /// Extra size added at priority 10.
    pub max_size_delta: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Priorities at or above this use the high tier.
    pub high_priority_threshold: i32,
    pub high_color: Color,
    pub low_color: Color,
    /// Scale multiplier applied while hovered.
    pub hover_scale: f32,
    /// Emissive multiplier applied while hovered.
    pub hover_emissive_boost: f32,
    /// Angular speed of the pulse, in radians per second.
    pub pulse_speed: f32,
    /// Pulse amplitude at priority 10.
    pub pulse_amplitude: f32,
    /// Reject hits hidden behind the planet.
    pub occlude_by_planet: bool,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            altitude: 0.02,
            base_size: 0.012,
            max_size_delta: 0.018,
            min_size: 0.01,
            max_size: 0.035,
            high_priority_threshold: 7,
            high_color: Color::srgb(1.0, 0.72, 0.25),
            low_color: Color::srgb(0.45, 0.8, 1.0),
            hover_scale: 1.5,
            hover_emissive_boost: 2.0,
            pulse_speed: 2.0,
            pulse_amplitude: 0.35,
            occlude_by_planet: true,
        }
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Orbit camera limits and input sensitivities.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Initial distance from the globe centre.
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Exponential damping rate, per second. Higher settles faster.
    pub damping: f32,
    /// Radians of orbit per pixel of drag.
    pub orbit_sensitivity: f32,
    /// Pan per pixel of drag, scaled by distance.
    pub pan_sensitivity: f32,
    /// Fractional zoom per wheel line.
    pub zoom_sensitivity: f32,
    /// Maximum distance the focus may be panned from the globe centre.
    pub max_pan: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 3.2,
            min_distance: 1.4,
            max_distance: 10.0,
            fov_degrees: 45.0,
            damping: 6.0,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.0015,
            zoom_sensitivity: 0.1,
            max_pan: 1.0,
        }
    }
}

// ============================================================================
// Globe
// ============================================================================

/// Complete globe configuration.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct GlobeConfig {
    pub planet: PlanetConfig,
    pub markers: MarkerConfig,
    pub starfield: StarfieldConfig,
    pub camera: CameraConfig,
}

impl GlobeConfig {
    /// Check every value that would otherwise produce a broken scene.
    pub fn validate(&self) -> Result<()> {
        let planet = &self.planet;
        positive("planet.radius", planet.radius)?;
        finite("planet.rotation_speed", planet.rotation_speed)?;
        positive("planet.surface_point_size", planet.surface_point_size)?;
        unit("planet.land_threshold", planet.land_threshold)?;
        unit("planet.ocean_darkening", planet.ocean_darkening)?;
        unit("planet.center_glow_strength", planet.center_glow_strength)?;
        positive("planet.silhouette_fade", planet.silhouette_fade)?;
        if planet.graticule_meridians == 0 || planet.graticule_segments < 3 {
            return Err(invalid(
                "planet.graticule_segments",
                "the wireframe needs at least one meridian and three segments",
            ));
        }
        positive("planet.core_radius_fraction", planet.core_radius_fraction)?;
        if planet.core_radius_fraction > 1.0 {
            return Err(invalid(
                "planet.core_radius_fraction",
                "the core must fit inside the planet",
            ));
        }
        positive("planet.core_rim_power", planet.core_rim_power)?;
        finite("planet.edge_strength", planet.edge_strength)?;
        finite("planet.core_glow_strength", planet.core_glow_strength)?;
        finite("planet.core_rim_strength", planet.core_rim_strength)?;

        let markers = &self.markers;
        finite("markers.altitude", markers.altitude)?;
        finite("markers.base_size", markers.base_size)?;
        finite("markers.max_size_delta", markers.max_size_delta)?;
        positive("markers.min_size", markers.min_size)?;
        finite("markers.max_size", markers.max_size)?;
        if markers.min_size > markers.max_size {
            return Err(invalid(
                "markers.max_size",
                format!(
                    "max_size {} is smaller than min_size {}",
                    markers.max_size, markers.min_size
                ),
            ));
        }
        positive("markers.hover_scale", markers.hover_scale)?;
        finite("markers.hover_emissive_boost", markers.hover_emissive_boost)?;
        finite("markers.pulse_speed", markers.pulse_speed)?;
        unit("markers.pulse_amplitude", markers.pulse_amplitude)?;

        let stars = &self.starfield;
        positive("starfield.inner_radius", stars.inner_radius)?;
        finite("starfield.outer_radius", stars.outer_radius)?;
        if stars.inner_radius > stars.outer_radius {
            return Err(invalid(
                "starfield.outer_radius",
                "outer shell is inside the inner shell",
            ));
        }
        unit("starfield.cluster_fraction", stars.cluster_fraction)?;
        finite("starfield.cluster_spread", stars.cluster_spread)?;
        finite("starfield.rotation_speed", stars.rotation_speed)?;
        positive("starfield.min_size", stars.min_size)?;
        finite("starfield.max_size", stars.max_size)?;
        if stars.min_size > stars.max_size {
            return Err(invalid(
                "starfield.max_size",
                "max_size is smaller than min_size",
            ));
        }

        let camera = &self.camera;
        finite("camera.min_distance", camera.min_distance)?;
        finite("camera.max_distance", camera.max_distance)?;
        finite("camera.orbit_sensitivity", camera.orbit_sensitivity)?;
        finite("camera.pan_sensitivity", camera.pan_sensitivity)?;
        unit("camera.zoom_sensitivity", camera.zoom_sensitivity)?;
        if camera.min_distance <= planet.radius {
            return Err(invalid(
                "camera.min_distance",
                format!(
                    "{} would put the camera inside the planet (radius {})",
                    camera.min_distance, planet.radius
                ),
            ));
        }
        if !(camera.min_distance..=camera.max_distance).contains(&camera.distance) {
            return Err(invalid(
                "camera.distance",
                format!(
                    "{} is outside [{}, {}]",
                    camera.distance, camera.min_distance, camera.max_distance
                ),
            ));
        }
        if !(1.0..179.0).contains(&camera.fov_degrees) {
            return Err(invalid("camera.fov_degrees", "must be in [1, 179)"));
        }
        positive("camera.damping", camera.damping)?;
        finite("camera.max_pan", camera.max_pan)?;
        if camera.max_pan < 0.0 {
            return Err(invalid("camera.max_pan", "must not be negative"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, detail: impl Into<String>) -> GlobeError {
    GlobeError::InvalidConfig {
        field,
        detail: detail.into(),
    }
}

fn finite(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not finite")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive")))
    }
}

fn unit(field: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}
