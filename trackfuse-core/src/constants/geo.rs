//! Earth Model Constants

/// Mean Earth radius in meters.
///
/// The IUGG mean radius R1. The haversine formula assumes a sphere, so the
/// error against WGS-84 is up to ~0.5% - irrelevant at the 5 m scale the
/// reconciler cares about.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
