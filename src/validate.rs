//! Range checks applied to a sweep before anything is sent to the meter.

use crate::measurement::MeasurementType;

pub const MIN_FREQUENCY_HZ: i64 = 1;
pub const MAX_FREQUENCY_HZ: i64 = 500_000;

pub const MAX_VOLTAGE_V: f64 = 2.0;

/// True iff every frequency lies in `[low_hz, high_hz]`.
pub fn frequencies_valid_within(values: &[i64], low_hz: i64, high_hz: i64) -> bool {
	values.iter().all(|f| (low_hz..=high_hz).contains(f))
}

pub fn frequencies_valid(values: &[i64]) -> bool {
	frequencies_valid_within(values, MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ)
}

/// True iff every voltage satisfies `low < v <= high`. NaN never passes.
pub fn voltages_valid_within(values: &[f64], low: f64, high: f64) -> bool {
	values.iter().all(|&v| v > low && v <= high)
}

pub fn voltages_valid(values: &[f64]) -> bool {
	voltages_valid_within(values, 0.0, MAX_VOLTAGE_V)
}

pub fn measurement_valid(code: &str) -> bool {
	MeasurementType::from_code(code).is_some()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frequency_bounds_are_inclusive() {
		assert!(frequencies_valid(&[1, 100, 500_000]));
		assert!(frequencies_valid(&[]));
		assert!(!frequencies_valid(&[0]));
		assert!(!frequencies_valid(&[100, 500_001]));
		assert!(!frequencies_valid(&[-5]));
		assert!(frequencies_valid_within(&[10, 20], 10, 20));
	}

	#[test]
	fn voltage_excludes_zero_includes_two() {
		assert!(voltages_valid(&[0.005, 0.5, 2.0]));
		assert!(!voltages_valid(&[0.0]));
		assert!(!voltages_valid(&[0.5, 2.0001]));
		assert!(!voltages_valid(&[-1.0]));
		assert!(!voltages_valid(&[f64::NAN]));
	}

	#[test]
	fn every_code_in_either_case() {
		for m in MeasurementType::ALL.iter() {
			assert!(measurement_valid(m.code()));
			assert!(measurement_valid(&m.code().to_lowercase()));
		}
		assert!(!measurement_valid("ZT"));
		assert!(!measurement_valid("foo"));
	}
}
