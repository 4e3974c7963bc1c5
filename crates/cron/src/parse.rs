//! Literal parsing for schedule fields.

use tortuga_config::TimeUnit;

/// A non-negative integer literal such as `"30"`.
pub fn parse_amount(spec: &str) -> Option<u64> {
    spec.trim().parse().ok()
}

/// A unit name such as `"SECONDS"`, in any case.
pub fn parse_unit(spec: &str) -> Option<TimeUnit> {
    spec.parse().ok()
}
