//! CPU mirrors of the planet shaders.
//!
//! The surface and core WGSL files implement these formulas per fragment.
//! Keeping them here lets the rules be unit tested. Changes must be made in
//! both places; `test_shader_sources_match` fails when the WGSL expressions
//! these functions mirror are edited.

use bevy::math::{Vec2, Vec3};

/// Largest distance from the map centre, reached at the corners.
const MAX_CENTER_DISTANCE: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Slow breathing factor of the core, in [0.4, 1.0].
pub fn core_pulse(time: f32) -> f32 {
    0.7 + 0.3 * (1.5 * time).sin()
}

/// Fresnel-like rim term from the cosine between normal and view direction.
pub fn rim(facing: f32, power: f32) -> f32 {
    (1.0 - facing.max(0.0)).powf(power)
}

/// Glow that is strongest at the disc centre and falls off towards its edge.
///
/// `distance` is the projected distance from the centre, 0 at the centre and
/// 1 at the silhouette.
pub fn radial_glow(distance: f32, strength: f32) -> f32 {
    let falloff = 1.0 - distance.clamp(0.0, 1.0);
    strength * falloff * falloff
}

/// Additive alpha of the core for one fragment, in [0, 1].
///
/// `normal` is the outward surface normal of the rendered back face, turned
/// towards the viewer.
pub fn core_alpha(
    normal: Vec3,
    view_dir: Vec3,
    time: f32,
    glow_strength: f32,
    rim_power: f32,
    rim_strength: f32,
) -> f32 {
    let facing = normal.dot(view_dir).max(0.0);
    let distance = (1.0 - facing * facing).max(0.0).sqrt();
    let glow = radial_glow(distance, glow_strength) * core_pulse(time);
    (glow + rim(facing, rim_power) * rim_strength).clamp(0.0, 1.0)
}

/// Whether a point with this normal is visible from `view_dir`.
pub fn is_front_facing(normal: Vec3, view_dir: Vec3) -> bool {
    normal.dot(view_dir) > 0.0
}

/// Land mask from the world map's red channel.
pub fn is_land(red: f32, threshold: f32) -> bool {
    red > threshold
}

/// Edge strength from the land channel of the four neighbouring texels.
pub fn edge_strength(left: f32, right: f32, up: f32, down: f32) -> f32 {
    ((right - left).abs() + (up - down).abs()).min(1.0)
}

/// Brightness multiplier that darkens the map away from its centre.
///
/// Returns 1 at `uv = (0.5, 0.5)` and `1 - strength` at the corners.
pub fn center_glow(uv: Vec2, strength: f32) -> f32 {
    let distance = (uv - Vec2::splat(0.5)).length() / MAX_CENTER_DISTANCE;
    let glow = radial_glow(distance, 1.0);
    (1.0 - strength) + strength * glow
}

/// Surface point alpha: zero behind the planet, fading in from the silhouette.
pub fn surface_alpha(facing: f32, fade_width: f32) -> f32 {
    if facing <= 0.0 {
        return 0.0;
    }
    smoothstep(0.0, fade_width, facing)
}

/// Surface colour for one point, before alpha.
#[allow(clippy::too_many_arguments)]
pub fn surface_color(
    land: bool,
    edge: f32,
    uv: Vec2,
    land_color: Vec3,
    ocean_color: Vec3,
    edge_color: Vec3,
    ocean_darkening: f32,
    edge_weight: f32,
    glow_strength: f32,
) -> Vec3 {
    let base = if land {
        land_color
    } else {
        ocean_color * (1.0 - ocean_darkening)
    };
    let highlighted = base.lerp(edge_color, (edge * edge_weight).clamp(0.0, 1.0));
    highlighted * center_glow(uv, glow_strength)
}

/// Hermite step matching WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_core_pulse_range() {
        assert!((core_pulse(0.0) - 0.7).abs() < EPSILON);
        let peak = std::f32::consts::FRAC_PI_2 / 1.5;
        assert!((core_pulse(peak) - 1.0).abs() < EPSILON);
        for i in 0..1_000 {
            let p = core_pulse(i as f32 * 0.037);
            assert!((0.4 - EPSILON..=1.0 + EPSILON).contains(&p));
        }
    }

    #[test]
    fn test_rim_peaks_at_silhouette() {
        assert!((rim(1.0, 3.0)).abs() < EPSILON);
        assert!((rim(0.0, 3.0) - 1.0).abs() < EPSILON);
        assert!((rim(-0.5, 3.0) - 1.0).abs() < EPSILON);
        assert!(rim(0.3, 3.0) > rim(0.6, 3.0));
    }

    #[test]
    fn test_core_alpha_combines_glow_and_rim() {
        // Looking straight at the centre: no rim, full glow.
        let centre = core_alpha(Vec3::Z, Vec3::Z, 0.0, 0.5, 3.0, 0.6);
        assert!((centre - 0.5 * 0.7).abs() < EPSILON);
        // At the silhouette: no glow, full rim.
        let edge = core_alpha(Vec3::X, Vec3::Z, 0.0, 0.5, 3.0, 0.6);
        assert!((edge - 0.6).abs() < EPSILON);
    }

    #[test]
    fn test_core_alpha_saturates() {
        assert_eq!(core_alpha(Vec3::Z, Vec3::Z, 0.0, 4.0, 3.0, 0.6), 1.0);
        assert_eq!(core_alpha(Vec3::X, Vec3::Z, 0.0, 0.5, 3.0, -2.0), 0.0);
    }

    #[test]
    fn test_shader_sources_match() {
        let core = include_str!("core_material.wgsl");
        for expr in [
            "let falloff = 1.0 - clamp(distance, 0.0, 1.0);",
            "sqrt(max(1.0 - facing * facing, 0.0))",
            "0.7 + 0.3 * sin(1.5 * params.time)",
            "pow(1.0 - facing, params.rim_power) * params.rim_strength",
            "clamp(radial_glow(distance) * pulse + rim, 0.0, 1.0)",
        ] {
            assert!(core.contains(expr), "core shader no longer has `{expr}`");
        }

        let surface = include_str!("surface_material.wgsl");
        for expr in [
            "const MAX_CENTER_DISTANCE: f32 = 0.70710678;",
            "(1.0 - params.glow_strength) + params.glow_strength * glow",
            "min(abs(right - left) + abs(up - down), 1.0)",
            "params.ocean_color.rgb * (1.0 - params.ocean_darkening)",
            "if land > params.land_threshold",
            "clamp(edge * params.edge_strength, 0.0, 1.0)",
            "smoothstep(0.0, params.fade_width, in.facing)",
        ] {
            assert!(surface.contains(expr), "surface shader no longer has `{expr}`");
        }
    }

    #[test]
    fn test_back_facing_points_discarded() {
        assert!(is_front_facing(Vec3::Z, Vec3::Z));
        assert!(!is_front_facing(Vec3::X, Vec3::Z));
        assert!(!is_front_facing(-Vec3::Z, Vec3::Z));
        assert_eq!(surface_alpha(-0.2, 0.3), 0.0);
        assert_eq!(surface_alpha(0.0, 0.3), 0.0);
    }

    #[test]
    fn test_silhouette_fade() {
        assert!(surface_alpha(0.05, 0.3) < surface_alpha(0.2, 0.3));
        assert!((surface_alpha(0.5, 0.3) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_edge_detection() {
        assert_eq!(edge_strength(1.0, 1.0, 1.0, 1.0), 0.0);
        assert_eq!(edge_strength(0.0, 0.0, 0.0, 0.0), 0.0);
        assert!((edge_strength(0.0, 1.0, 0.5, 0.5) - 1.0).abs() < EPSILON);
        assert!((edge_strength(0.0, 0.5, 0.0, 0.0) - 0.5).abs() < EPSILON);
        assert_eq!(edge_strength(0.0, 1.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_center_glow_darkens_towards_edges() {
        assert!((center_glow(Vec2::splat(0.5), 0.6) - 1.0).abs() < EPSILON);
        assert!((center_glow(Vec2::ZERO, 0.6) - 0.4).abs() < EPSILON);
        assert!(center_glow(Vec2::new(0.6, 0.5), 0.6) > center_glow(Vec2::new(0.9, 0.5), 0.6));
    }

    #[test]
    fn test_oceans_darker_than_land() {
        let land = surface_color(
            true,
            0.0,
            Vec2::splat(0.5),
            Vec3::splat(0.8),
            Vec3::splat(0.8),
            Vec3::ONE,
            0.5,
            1.0,
            0.0,
        );
        let ocean = surface_color(
            false,
            0.0,
            Vec2::splat(0.5),
            Vec3::splat(0.8),
            Vec3::splat(0.8),
            Vec3::ONE,
            0.5,
            1.0,
            0.0,
        );
        assert!(ocean.length() < land.length());
        assert!(is_land(0.9, 0.5));
        assert!(!is_land(0.1, 0.5));
    }
}
