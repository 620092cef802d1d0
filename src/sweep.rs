//! Frequency and amplitude sweeps.
//!
//! A sweep holds one quantity fixed and steps the other through a list, fetching one
//! measurement per point. The whole request is validated before the first command goes out,
//! and any failure part way through abandons the sweep.

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{Error, ParameterCheck, Result};
use crate::measurement::MeasurementType;
use crate::transport::Transport;
use crate::utils::format_voltage;
use crate::validate;

/// Number of sweeps in a batch run.
pub const BATCH_RUNS: usize = 5;

/// The quantity stepped through during a sweep, with its points in sweep order.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepAxis {
	/// Test signal frequencies in Hz, swept at a fixed AC voltage.
	Frequency(Vec<i64>),
	/// AC voltages in V, swept at a fixed frequency.
	Amplitude(Vec<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
	Frequency,
	Amplitude,
}

impl AxisKind {
	/// Column label used in the log file header.
	pub fn log_label(self) -> &'static str {
		match self {
			AxisKind::Frequency => "Freq [Hz]",
			AxisKind::Amplitude => "Ampl. [V]",
		}
	}
}

impl SweepAxis {
	pub fn kind(&self) -> AxisKind {
		match self {
			SweepAxis::Frequency(_) => AxisKind::Frequency,
			SweepAxis::Amplitude(_) => AxisKind::Amplitude,
		}
	}

	pub fn len(&self) -> usize {
		match self {
			SweepAxis::Frequency(points) => points.len(),
			SweepAxis::Amplitude(points) => points.len(),
		}
	}

	pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// `fixed` is the AC voltage for a frequency sweep and the frequency for an amplitude sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRequest {
	pub axis: SweepAxis,
	pub fixed: f64,
	pub measurement: String,
}

impl SweepRequest {
	pub fn frequency(frequencies: Vec<i64>, voltage: f64, measurement: &str) -> Self {
		SweepRequest{ axis: SweepAxis::Frequency(frequencies), fixed: voltage, measurement: measurement.to_owned() }
	}

	pub fn amplitude(voltages: Vec<f64>, frequency: i64, measurement: &str) -> Self {
		SweepRequest{ axis: SweepAxis::Amplitude(voltages), fixed: frequency as f64, measurement: measurement.to_owned() }
	}

	/// Checks every parameter; nothing about the request is trusted until this passes.
	pub fn validate(&self) -> Result<MeasurementType> {
		let reject = |check| Err(Error::InvalidSweepParameters(check));

		match &self.axis {
			SweepAxis::Frequency(points) => {
				if !validate::voltages_valid(&[self.fixed]) { return reject(ParameterCheck::Voltage); }
				if !validate::frequencies_valid(points) { return reject(ParameterCheck::Frequency); }
			},
			SweepAxis::Amplitude(points) => {
				if self.fixed.fract() != 0.0 || !validate::frequencies_valid(&[self.fixed as i64]) {
					return reject(ParameterCheck::Frequency);
				}
				if !validate::voltages_valid(points) { return reject(ParameterCheck::Voltage); }
			},
		}

		match MeasurementType::from_code(&self.measurement) {
			Some(m) => Ok(m),
			None => reject(ParameterCheck::Measurement(self.measurement.clone())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSample {
	pub axis_value: f64,
	pub primary: f64,
	pub secondary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
	pub kind: AxisKind,
	pub measurement: MeasurementType,
	pub fixed: f64,
	pub samples: Vec<MeasurementSample>,
}

fn frequency_command(hz: i64) -> String { format!("FREQ {}Hz", hz) }

fn voltage_command(volts: f64) -> String { format!("VOLT {} V", format_voltage(volts)) }

/// Splits a `fetch?` reply into its first two numeric fields. Anything after them is ignored.
pub fn decode_fetch(response: &str) -> Result<(f64, f64)> {
	let malformed = |reason: &str| Error::MalformedResponse{ response: response.to_owned(), reason: reason.to_owned() };

	let mut fields = response.trim().split(',').map(str::trim);
	let mut next = |name: &str| -> Result<f64> {
		match fields.next() {
			Some(s) if !s.is_empty() => s.parse::<f64>().map_err(|_| malformed(&format!("{} field {:?} is not a number", name, s))),
			_ => Err(malformed(&format!("missing {} field", name))),
		}
	};

	let primary = next("primary")?;
	let secondary = next("secondary")?;
	Ok((primary, secondary))
}

fn fetch_point<T: Transport>(transport: &mut T, set_command: &str, axis_value: f64) -> Result<MeasurementSample> {
	transport.send(set_command)?;
	let response = transport.query("fetch?")?;
	let (primary, secondary) = decode_fetch(&response)?;
	debug!("{} -> {:e}, {:e}", axis_value, primary, secondary);
	Ok(MeasurementSample{ axis_value, primary, secondary })
}

/// Runs one sweep to completion, one configure-then-fetch round trip per point.
pub fn run_sweep<T: Transport>(transport: &mut T, request: &SweepRequest) -> Result<SweepResult> {
	let measurement = request.validate()?;
	let kind = request.axis.kind();
	info!("Starting {:?} sweep of {} point(s), measuring {}", kind, request.axis.len(), measurement);
	if request.axis.is_empty() {
		warn!("{:?} sweep has no points, only the fixed setting will be sent", kind);
	}

	transport.send(&format!("FUNC:IMP {}", measurement.code()))?;

	let mut samples = Vec::with_capacity(request.axis.len());
	match &request.axis {
		SweepAxis::Frequency(points) => {
			transport.send(&voltage_command(request.fixed))?;
			for &hz in points {
				samples.push(fetch_point(transport, &frequency_command(hz), hz as f64)?);
			}
		},
		SweepAxis::Amplitude(points) => {
			transport.send(&frequency_command(request.fixed as i64))?;
			for &volts in points {
				samples.push(fetch_point(transport, &voltage_command(volts), volts)?);
			}
		},
	}

	info!("Sweep finished with {} sample(s)", samples.len());
	Ok(SweepResult{ kind, measurement, fixed: request.fixed, samples })
}

/// Runs the same sweep `runs` times, handing each result to `record` as soon as it is measured.
/// Stops at the first failure of either; whatever `record` already did for earlier runs stands.
/// Returns the number of completed runs.
pub fn run_batch<T, E, F>(transport: &mut T, request: &SweepRequest, runs: usize, mut record: F) -> std::result::Result<usize, E>
where
	T: Transport,
	E: From<Error>,
	F: FnMut(usize, &SweepResult) -> std::result::Result<(), E>,
{
	for i in 1..=runs {
		let result = match run_sweep(transport, request) {
			Ok(result) => result,
			Err(e) => {
				warn!("Sweep {} of {} failed: {}", i, runs, e);
				return Err(e.into());
			},
		};
		record(i, &result)?;
	}
	info!("Batch of {} sweep(s) complete", runs);
	Ok(runs)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fetch_takes_first_two_fields() {
		assert_eq!(decode_fetch("123.4,56.7").unwrap(), (123.4, 56.7));
		assert_eq!(decode_fetch("+1.00000e+02, -4.5e-01,+0\n").unwrap(), (100.0, -0.45));
	}

	#[test]
	fn fetch_rejects_short_or_garbage_replies() {
		assert!(matches!(decode_fetch("123.4"), Err(Error::MalformedResponse{ .. })));
		assert!(matches!(decode_fetch(""), Err(Error::MalformedResponse{ .. })));
		assert!(matches!(decode_fetch("1.0,abc"), Err(Error::MalformedResponse{ .. })));
		assert!(matches!(decode_fetch("1.0,,2.0"), Err(Error::MalformedResponse{ .. })));
	}

	#[test]
	fn command_number_formatting() {
		assert_eq!(frequency_command(1000), "FREQ 1000Hz");
		assert_eq!(voltage_command(0.5), "VOLT 0.5 V");
		assert_eq!(voltage_command(2.0), "VOLT 2.0 V");
	}

	#[test]
	fn validation_order_and_reasons() {
		let bad_fixed = SweepRequest::frequency(vec![600_000], 3.0, "nope");
		assert!(matches!(bad_fixed.validate(), Err(Error::InvalidSweepParameters(ParameterCheck::Voltage))));

		let bad_axis = SweepRequest::frequency(vec![100, 600_000], 0.5, "ZTD");
		assert!(matches!(bad_axis.validate(), Err(Error::InvalidSweepParameters(ParameterCheck::Frequency))));

		let bad_code = SweepRequest::amplitude(vec![0.5], 1000, "ZZZ");
		assert!(matches!(bad_code.validate(), Err(Error::InvalidSweepParameters(ParameterCheck::Measurement(_)))));

		let bad_fixed_freq = SweepRequest::amplitude(vec![0.5], 0, "ZTD");
		assert!(matches!(bad_fixed_freq.validate(), Err(Error::InvalidSweepParameters(ParameterCheck::Frequency))));

		assert_eq!(SweepRequest::amplitude(vec![0.2, 2.0], 1000, "cpd").validate().unwrap(), MeasurementType::CPD);
	}
}
