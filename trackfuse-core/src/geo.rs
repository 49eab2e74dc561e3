//! Geographic math
//!
//! Pure functions, no failure modes. Trigonometry goes through `libm` so that
//! results are identical on every target, which keeps reconciled coordinates
//! reproducible between the device that computed them and any replay.

use crate::constants::EARTH_RADIUS_M;
use crate::types::Coordinates;

/// Great-circle distance between two points in meters (haversine)
pub fn distance(p1: Coordinates, p2: Coordinates) -> f64 {
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lon = (p2.lon - p1.lon).to_radians();

    let sin_lat = libm::sin(d_lat / 2.0);
    let sin_lon = libm::sin(d_lon / 2.0);
    let a = sin_lat * sin_lat
        + libm::cos(p1.lat.to_radians()) * libm::cos(p2.lat.to_radians()) * sin_lon * sin_lon;
    let c = 2.0 * libm::atan2(libm::sqrt(a), libm::sqrt(1.0 - a));

    EARTH_RADIUS_M * c
}

/// Linear interpolation: `a + (b - a) * alpha`
///
/// `alpha` is not clamped; callers guarantee it lies in `[0, 1]`.
pub fn interpolate(a: f64, b: f64, alpha: f64) -> f64 {
    a + (b - a) * alpha
}

/// Componentwise [`interpolate`] between two coordinates
pub fn interpolate_coords(a: Coordinates, b: Coordinates, alpha: f64) -> Coordinates {
    Coordinates::new(interpolate(a.lat, b.lat, alpha), interpolate(a.lon, b.lon, alpha))
}
