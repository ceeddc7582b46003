//! Names of the hospital dataset columns the analysis relies on.

pub const HOSPITAL_NAME: &str = "Hospital Name";
pub const CITY: &str = "City";
pub const STATE: &str = "State";
pub const ZIP_CODE: &str = "ZIP Code";
pub const PHONE_NUMBER: &str = "Phone Number";
pub const OWNERSHIP: &str = "Hospital Ownership";
pub const EMERGENCY_SERVICES: &str = "Emergency Services";
pub const OVERALL_RATING: &str = "Hospital overall rating";

/// Emergency Services value for hospitals that offer them.
pub const YES: &str = "Yes";
/// Emergency Services value for hospitals that do not.
pub const NO: &str = "No";
