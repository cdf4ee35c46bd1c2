//! Offer-side input validation.

/// Upper bound on a plausible ETA, in minutes (24 hours).
pub const MAX_ETA_MINUTES: i32 = 24 * 60;

/// Validate an offered price (whole currency units, strictly positive).
pub fn validate_price(price: i64) -> Result<(), String> {
    if price <= 0 {
        return Err(format!("Offer price {price} must be positive"));
    }
    Ok(())
}

/// Validate an ETA in minutes.
pub fn validate_eta_minutes(eta: i32) -> Result<(), String> {
    if eta <= 0 {
        return Err(format!("ETA {eta} must be positive"));
    }
    if eta > MAX_ETA_MINUTES {
        return Err(format!("ETA {eta} exceeds maximum of {MAX_ETA_MINUTES} minutes"));
    }
    Ok(())
}

/// Validate the full set of fields on a new nurse offer.
pub fn validate_new_offer(price: i64, eta_minutes: i32) -> Result<(), String> {
    validate_price(price)?;
    validate_eta_minutes(eta_minutes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_offer_accepted() {
        assert!(validate_new_offer(1500, 20).is_ok());
        assert!(validate_new_offer(1, MAX_ETA_MINUTES).is_ok());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(validate_price(0).is_err());
        assert!(validate_price(-1500).is_err());
    }

    #[test]
    fn test_bad_eta_rejected() {
        assert!(validate_eta_minutes(0).is_err());
        assert!(validate_eta_minutes(-10).is_err());
        assert!(validate_eta_minutes(MAX_ETA_MINUTES + 1).is_err());
    }
}
