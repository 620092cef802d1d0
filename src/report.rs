//! Console tables and the append-only tab-delimited log for finished sweeps.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use log::info;

use crate::error::{Error, Result};
use crate::sweep::{AxisKind, SweepResult};
use crate::utils::{format_exp, format_voltage};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Lines of the human readable table for `result`, without trailing newlines.
pub fn render_table(result: &SweepResult) -> Vec<String> {
	let (primary, secondary) = result.measurement.labels();
	let mut lines = vec![];

	match result.kind {
		AxisKind::Frequency => {
			lines.push("Frequency sweep".to_owned());
			lines.push(format!("AC voltage: {:.3} V", result.fixed));
			lines.push(String::new());
			lines.push(format!("Frequency [Hz]    {:<12}{:<12}", primary, secondary));
		},
		AxisKind::Amplitude => {
			lines.push("Amplitude sweep".to_owned());
			lines.push(format!("Frequency: {:<8.0} Hz", result.fixed));
			lines.push(String::new());
			lines.push(format!("Amplitude [V]    {:<12}{:<12}", primary, secondary));
		},
	}
	lines.push("-".repeat(41));

	for s in &result.samples {
		let axis = match result.kind {
			AxisKind::Frequency => format!("{:<18.0}", s.axis_value),
			AxisKind::Amplitude => format!("{:<15.3}", s.axis_value),
		};
		lines.push(format!("{}{:<12}{:<12}", axis, format_exp(s.primary, 3), format_exp(s.secondary, 3)));
	}
	lines.push("-".repeat(42));

	lines
}

/// Writes one self-describing block: timestamp, column header, data rows, blank line.
pub fn write_block<W: Write, Tz: TimeZone>(out: &mut W, result: &SweepResult, timestamp: &DateTime<Tz>) -> io::Result<()>
where
	Tz::Offset: std::fmt::Display,
{
	let (primary, secondary) = result.measurement.labels();

	let mut block = String::new();
	block.push_str(&format!("# Timestamp: {}\n", timestamp.format(TIMESTAMP_FORMAT)));
	block.push_str(&format!("# {:<6}\t{:<8}\t{:<8}\n", result.kind.log_label(), primary, secondary));
	for s in &result.samples {
		let axis = match result.kind {
			AxisKind::Frequency => s.axis_value.to_string(),
			AxisKind::Amplitude => format_voltage(s.axis_value),
		};
		block.push_str(&format!("{:<8}\t{}\t{}\n", axis, format_exp(s.primary, 8), format_exp(s.secondary, 8)));
	}
	block.push('\n');

	// One write per block so an interrupted append never leaves half a header behind
	out.write_all(block.as_bytes())?;
	out.flush()
}

/// Appends `result` to `path`, creating the file if needed. Existing content is never touched.
pub fn append_log<P: AsRef<Path>>(result: &SweepResult, path: P) -> Result<()> {
	let path = path.as_ref();
	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.map_err(|e| Error::io(path, e))?;

	write_block(&mut file, result, &Local::now()).map_err(|e| Error::io(path, e))?;
	info!("Appended {} sample(s) to {}", result.samples.len(), path.display());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	use crate::measurement::MeasurementType;
	use crate::sweep::MeasurementSample;

	fn sample(axis_value: f64, primary: f64, secondary: f64) -> MeasurementSample {
		MeasurementSample{ axis_value, primary, secondary }
	}

	fn frequency_result() -> SweepResult {
		SweepResult {
			kind: AxisKind::Frequency,
			measurement: MeasurementType::ZTD,
			fixed: 0.5,
			samples: vec![sample(100.0, 123.4, 56.7), sample(1000.0, 0.0123, -89.5)],
		}
	}

	#[test]
	fn frequency_table() {
		let lines = render_table(&frequency_result());
		assert_eq!(lines[0], "Frequency sweep");
		assert_eq!(lines[1], "AC voltage: 0.500 V");
		assert_eq!(lines[3], "Frequency [Hz]    Z [Ohm]     Theta [Deg] ");
		assert_eq!(lines[5], "100               1.234e+02   5.670e+01   ");
		assert_eq!(lines[6], "1000              1.230e-02   -8.950e+01  ");
		assert_eq!(lines.len(), 8);
	}

	#[test]
	fn amplitude_table() {
		let result = SweepResult {
			kind: AxisKind::Amplitude,
			measurement: MeasurementType::CPD,
			fixed: 1000.0,
			samples: vec![sample(0.2, 1.0e-9, 0.01)],
		};
		let lines = render_table(&result);
		assert_eq!(lines[1], "Frequency: 1000     Hz");
		assert_eq!(lines[3], "Amplitude [V]    Cp [F]      Dissip. [-] ");
		assert_eq!(lines[5], "0.200          1.000e-09   1.000e-02   ");
	}

	#[test]
	fn log_block_layout() {
		let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
		let mut out: Vec<u8> = vec![];
		write_block(&mut out, &frequency_result(), &ts).unwrap();

		let text = String::from_utf8(out).unwrap();
		assert_eq!(text, "# Timestamp: 09/03/2024 14:05:07\n\
			# Freq [Hz]\tZ [Ohm] \tTheta [Deg]\n\
			100     \t1.23400000e+02\t5.67000000e+01\n\
			1000    \t1.23000000e-02\t-8.95000000e+01\n\
			\n");
	}
}
