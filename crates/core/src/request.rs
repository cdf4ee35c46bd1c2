//! Request-side input validation.
//!
//! Applied before any row is written; a request that fails these checks is
//! rejected with a 400 and never enters the dispatch state machine.

use crate::geo::validate_coordinates;
use crate::urgency::validate_urgency;

/// Upper bound on requested service codes per request.
pub const MAX_SERVICE_CODES: usize = 20;

/// Validate the set of requested service codes.
///
/// At least one code is required and blank codes are rejected. Whether a
/// code exists in the service catalog is the catalog collaborator's
/// concern, not ours.
pub fn validate_service_codes(codes: &[String]) -> Result<(), String> {
    if codes.is_empty() {
        return Err("At least one service code is required".to_string());
    }
    if codes.len() > MAX_SERVICE_CODES {
        return Err(format!(
            "Too many service codes ({}, max {MAX_SERVICE_CODES})",
            codes.len()
        ));
    }
    if codes.iter().any(|c| c.trim().is_empty()) {
        return Err("Service codes must not be blank".to_string());
    }
    Ok(())
}

/// Validate an optional patient-proposed price (whole currency units).
pub fn validate_proposed_price(price: Option<i64>) -> Result<(), String> {
    match price {
        Some(p) if p <= 0 => Err(format!("Proposed price {p} must be positive")),
        _ => Ok(()),
    }
}

/// Validate the full set of fields on a new emergency request.
pub fn validate_new_request(
    latitude: f64,
    longitude: f64,
    service_codes: &[String],
    urgency: &str,
    proposed_price: Option<i64>,
) -> Result<(), String> {
    validate_coordinates(latitude, longitude)?;
    validate_service_codes(service_codes)?;
    validate_urgency(urgency)?;
    validate_proposed_price(proposed_price)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urgency::URGENCY_CRITICAL;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_request_accepted() {
        assert!(validate_new_request(
            24.7,
            46.7,
            &codes(&["wound_care", "iv_therapy"]),
            URGENCY_CRITICAL,
            Some(1500),
        )
        .is_ok());
    }

    #[test]
    fn test_empty_service_codes_rejected() {
        let result = validate_service_codes(&[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("At least one"));
    }

    #[test]
    fn test_blank_service_code_rejected() {
        assert!(validate_service_codes(&codes(&["wound_care", "  "])).is_err());
    }

    #[test]
    fn test_too_many_service_codes_rejected() {
        let many: Vec<String> = (0..=MAX_SERVICE_CODES).map(|i| format!("svc_{i}")).collect();
        assert!(validate_service_codes(&many).is_err());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(validate_proposed_price(Some(0)).is_err());
        assert!(validate_proposed_price(Some(-100)).is_err());
        assert!(validate_proposed_price(None).is_ok());
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        assert!(
            validate_new_request(95.0, 0.0, &codes(&["wound_care"]), URGENCY_CRITICAL, None)
                .is_err()
        );
    }
}
