//! Urgency level constants and validation.
//!
//! Urgency is advisory metadata on a request; it does not change any
//! state-machine rule, only how the request is surfaced to nurses.

/// No particular time pressure.
pub const URGENCY_ROUTINE: &str = "routine";

/// The patient needs a nurse within the hour.
pub const URGENCY_WITHIN_HOUR: &str = "within_hour";

/// Life- or limb-threatening; highest dispatch priority.
pub const URGENCY_CRITICAL: &str = "critical";

/// All valid urgency values.
pub const VALID_URGENCIES: &[&str] = &[URGENCY_ROUTINE, URGENCY_WITHIN_HOUR, URGENCY_CRITICAL];

/// Validate that an urgency string is one of the accepted values.
pub fn validate_urgency(urgency: &str) -> Result<(), String> {
    if VALID_URGENCIES.contains(&urgency) {
        Ok(())
    } else {
        Err(format!(
            "Invalid urgency '{urgency}'. Must be one of: {}",
            VALID_URGENCIES.join(", ")
        ))
    }
}
