/// Common constants used across the domain services

/// Length of "recent activity" slices in status reports
pub(crate) const RECENT_ACTIVITY: usize = 5;

/// Length of the recent access slice in the skill inventory
pub(crate) const RECENT_ACCESSES: usize = 10;

/// Health reported when a service holds no scored entities
pub(crate) const EMPTY_HEALTH: f64 = 1.0;

/// Logical name of the state-management collaborator
pub(crate) const STATE_MANAGEMENT: &str = "state-management";
