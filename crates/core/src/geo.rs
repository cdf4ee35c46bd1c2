//! Coordinate validation for request locations and tracking updates.

/// Validate a latitude/longitude pair.
///
/// Latitude must be within [-90, 90] and longitude within [-180, 180];
/// NaN is rejected by the range checks.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("Latitude {latitude} out of range [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("Longitude {longitude} out of range [-180, 180]"));
    }
    Ok(())
}
