/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters between two `(lat, lon)` points in degrees.
///
/// Spherical-earth haversine; gridded outputs depend on this exact form.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let delta_lat = lat2 - lat1;
    let delta_lon = lon2 - lon1;
    let d = (delta_lat * 0.5).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon * 0.5).sin().powi(2);

    2.0 * EARTH_RADIUS_M * d.sqrt().asin()
}
