//! Reconciliation configuration.

use chrono::Duration;

/// Time windows and commercial parameters for reconciliation.
///
/// Manifest cancellations, the interactive toggle and whole-trip
/// cancellation each have their own fee threshold.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Remark a fee when a manifest cancels the last passenger of a trip
    /// less than this many minutes before pickup.
    pub cascade_fee_threshold_mins: i64,

    /// Flag a fee when the interactive toggle cancels the last passenger
    /// less than this many minutes before pickup.
    pub toggle_fee_threshold_mins: i64,

    /// Flag a fee when a whole trip is cancelled less than this many
    /// minutes before pickup.
    pub cancel_trip_fee_threshold_mins: i64,

    /// A trip left empty more than this many minutes before pickup is
    /// deleted; otherwise it is cancelled with a fee remark.
    pub vacated_trip_threshold_mins: i64,

    /// Drivers can still be assigned up to this many minutes after pickup.
    pub assignment_cutoff_mins: i64,

    /// Trips are kept for this many months after creation.
    pub retention_months: u32,

    /// Markup applied to the subcontractor price to get the external price.
    pub price_margin: f64,
}

impl ReconcileConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        cascade_fee_threshold_mins: i64,
        toggle_fee_threshold_mins: i64,
        cancel_trip_fee_threshold_mins: i64,
        vacated_trip_threshold_mins: i64,
        assignment_cutoff_mins: i64,
        retention_months: u32,
        price_margin: f64,
    ) -> Self {
        Self {
            cascade_fee_threshold_mins,
            toggle_fee_threshold_mins,
            cancel_trip_fee_threshold_mins,
            vacated_trip_threshold_mins,
            assignment_cutoff_mins,
            retention_months,
            price_margin,
        }
    }

    pub fn cascade_fee_threshold(&self) -> Duration {
        Duration::minutes(self.cascade_fee_threshold_mins)
    }

    pub fn toggle_fee_threshold(&self) -> Duration {
        Duration::minutes(self.toggle_fee_threshold_mins)
    }

    pub fn cancel_trip_fee_threshold(&self) -> Duration {
        Duration::minutes(self.cancel_trip_fee_threshold_mins)
    }

    pub fn vacated_trip_threshold(&self) -> Duration {
        Duration::minutes(self.vacated_trip_threshold_mins)
    }

    pub fn assignment_cutoff(&self) -> Duration {
        Duration::minutes(self.assignment_cutoff_mins)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            cascade_fee_threshold_mins: 60,
            toggle_fee_threshold_mins: 120,
            cancel_trip_fee_threshold_mins: 120,
            vacated_trip_threshold_mins: 120,
            assignment_cutoff_mins: 120,
            retention_months: 30,
            price_margin: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ReconcileConfig::default();

        assert_eq!(config.cascade_fee_threshold_mins, 60);
        assert_eq!(config.toggle_fee_threshold_mins, 120);
        assert_eq!(config.cancel_trip_fee_threshold_mins, 120);
        assert_eq!(config.vacated_trip_threshold_mins, 120);
        assert_eq!(config.assignment_cutoff_mins, 120);
        assert_eq!(config.retention_months, 30);
        assert!((config.price_margin - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_methods() {
        let config = ReconcileConfig::default();

        assert_eq!(config.cascade_fee_threshold(), Duration::hours(1));
        assert_eq!(config.toggle_fee_threshold(), Duration::hours(2));
        assert_eq!(config.cancel_trip_fee_threshold(), Duration::hours(2));
        assert_eq!(config.vacated_trip_threshold(), Duration::hours(2));
        assert_eq!(config.assignment_cutoff(), Duration::hours(2));
    }

    #[test]
    fn custom_config() {
        let config = ReconcileConfig::new(30, 90, 60, 180, 15, 12, 0.1);

        assert_eq!(config.cascade_fee_threshold(), Duration::minutes(30));
        assert_eq!(config.toggle_fee_threshold(), Duration::minutes(90));
        assert_eq!(config.cancel_trip_fee_threshold(), Duration::minutes(60));
        assert_eq!(config.vacated_trip_threshold(), Duration::minutes(180));
        assert_eq!(config.assignment_cutoff(), Duration::minutes(15));
        assert_eq!(config.retention_months, 12);
    }
}
