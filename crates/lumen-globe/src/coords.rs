//! Coordinate conversion utilities.
//!
//! Maps geographic coordinates (latitude, longitude) onto the globe's local
//! frame. The frame is Y-up with a 180° longitude offset so that the prime
//! meridian of an equirectangular world map lands on the +X axis.

use bevy::math::{Vec2, Vec3};
use glam::DVec3;

/// Convert latitude, longitude (degrees) and radius to a position on the sphere.
///
/// Computed in double precision and narrowed at the end, so repeated calls
/// with the same inputs always return the same vector.
#[allow(clippy::cast_possible_truncation)]
pub fn lat_lng_to_position(lat_deg: f64, lng_deg: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lng_deg + 180.0).to_radians();
    DVec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
    .as_vec3()
}

/// Convert a position in the globe frame back to latitude and longitude (degrees).
///
/// Longitude is wrapped to [-180, 180]. The origin maps to (0, 0).
pub fn position_to_lat_lng(position: Vec3) -> (f64, f64) {
    let p = position.as_dvec3();
    let radius = p.length();
    if radius == 0.0 {
        return (0.0, 0.0);
    }
    let lat = (p.y / radius).clamp(-1.0, 1.0).asin().to_degrees();
    let theta = p.z.atan2(-p.x).to_degrees();
    (lat, wrap_longitude(theta - 180.0))
}

/// Texture coordinate of a latitude/longitude on an equirectangular map.
///
/// `u` runs west to east from the antimeridian, `v` runs north to south.
#[allow(clippy::cast_possible_truncation)]
pub fn equirect_uv(lat_deg: f64, lng_deg: f64) -> Vec2 {
    Vec2::new(
        ((lng_deg + 180.0) / 360.0) as f32,
        ((90.0 - lat_deg) / 180.0) as f32,
    )
}

/// Wrap a longitude in degrees into [-180, 180].
fn wrap_longitude(lng_deg: f64) -> f64 {
    let wrapped = (lng_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the eastern edge for inputs that sit on it.
    if wrapped == -180.0 && lng_deg > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_prime_meridian_on_positive_x() {
        let p = lat_lng_to_position(0.0, 0.0, 1.0);
        assert!((p - Vec3::X).length() < EPSILON, "{p:?}");
    }

    #[test]
    fn test_poles_on_y_axis() {
        let north = lat_lng_to_position(90.0, 0.0, 2.0);
        let south = lat_lng_to_position(-90.0, 45.0, 2.0);
        assert!((north - Vec3::new(0.0, 2.0, 0.0)).length() < EPSILON);
        assert!((south - Vec3::new(0.0, -2.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_round_trip_new_york() {
        let p = lat_lng_to_position(40.7, -74.0, 1.02);
        let (lat, lng) = position_to_lat_lng(p);
        assert!((lat - 40.7).abs() < 1e-3);
        assert!((lng + 74.0).abs() < 1e-3);
    }

    #[test]
    fn test_origin_maps_to_null_island() {
        assert_eq!(position_to_lat_lng(Vec3::ZERO), (0.0, 0.0));
    }

    #[test]
    fn test_equirect_uv_corners() {
        assert_eq!(equirect_uv(90.0, -180.0), Vec2::new(0.0, 0.0));
        assert_eq!(equirect_uv(-90.0, 180.0), Vec2::new(1.0, 1.0));
        assert_eq!(equirect_uv(0.0, 0.0), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_wrap_longitude() {
        assert!((wrap_longitude(190.0) + 170.0).abs() < 1e-9);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < 1e-9);
        assert!((wrap_longitude(180.0) - 180.0).abs() < 1e-9);
        assert!((wrap_longitude(-180.0) + 180.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_position_is_deterministic(
            lat in -90.0f64..=90.0,
            lng in -180.0f64..=180.0,
            radius in 0.1f64..500.0,
        ) {
            prop_assert_eq!(
                lat_lng_to_position(lat, lng, radius),
                lat_lng_to_position(lat, lng, radius)
            );
        }

        #[test]
        fn prop_position_lies_on_sphere(
            lat in -90.0f64..=90.0,
            lng in -180.0f64..=180.0,
            radius in 0.1f64..500.0,
        ) {
            let length = f64::from(lat_lng_to_position(lat, lng, radius).length());
            prop_assert!((length - radius).abs() <= radius * 1e-5);
        }

        #[test]
        fn prop_latitude_survives_round_trip(
            lat in -89.0f64..=89.0,
            lng in -179.0f64..=179.0,
        ) {
            let (lat_back, lng_back) = position_to_lat_lng(lat_lng_to_position(lat, lng, 1.0));
            prop_assert!((lat_back - lat).abs() < 1e-3);
            prop_assert!((lng_back - lng).abs() < 1e-3);
        }
    }
}
