//! Post-completion rating validation.
//!
//! A rating is captured at most once per request, only after completion.
//! The once-only rule itself is enforced by the lifecycle controller; this
//! module only validates the submitted values.

/// Lowest accepted star rating.
pub const MIN_RATING: i16 = 1;

/// Highest accepted star rating.
pub const MAX_RATING: i16 = 5;

/// Validate a star rating value.
pub fn validate_rating(rating: i16) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!(
            "Rating {rating} out of range [{MIN_RATING}, {MAX_RATING}]"
        ))
    }
}

/// Validate an optional tip amount (whole currency units, non-negative).
pub fn validate_tip(tip: Option<i64>) -> Result<(), String> {
    match tip {
        Some(t) if t < 0 => Err(format!("Tip amount {t} must not be negative")),
        _ => Ok(()),
    }
}
