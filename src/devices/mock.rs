//! Simulated LCR meter
//!
//! `MockMeter` answers the same commands as the real meter over an in-process [`Transport`],
//! measuring a series R-L-C device under test. It keeps a log of every command it accepted,
//! and can be told to reply with a fixed string or to stop answering after a number of commands.

use std::f64::consts::PI;
use std::io::{self, Error, ErrorKind};

use log::{debug, warn};

use crate::measurement::MeasurementType;
use crate::transport::Transport;
use crate::utils::format_exp;

pub const MOCK_IDN: &str = "B&K Precision,894,SIM000000,V1.0.0,V1.0";

/// Series resistance, inductance and capacitance of the simulated device under test.
/// A capacitance of zero means no capacitor in the circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRlc {
	pub r_ohms: f64,
	pub l_henries: f64,
	pub c_farads: f64,
}

impl Default for SeriesRlc {
	/// A 100 nF capacitor with 50 Ohm of series resistance.
	fn default() -> Self {
		SeriesRlc{ r_ohms: 50.0, l_henries: 0.0, c_farads: 100e-9 }
	}
}

impl SeriesRlc {

	/// Complex impedance (R, X) at `hz`.
	pub fn impedance(&self, hz: f64) -> (f64, f64) {
		let w = 2.0 * PI * hz;
		let xc = if self.c_farads > 0.0 { 1.0 / (w * self.c_farads) } else { 0.0 };
		(self.r_ohms, w * self.l_henries - xc)
	}

	/// The primary and secondary quantity `function` reports at `hz`.
	pub fn measure(&self, function: MeasurementType, hz: f64) -> (f64, f64) {
		use MeasurementType::*;

		let w = 2.0 * PI * hz;
		let (r, x) = self.impedance(hz);
		let z2 = r * r + x * x;
		let (g, b) = (r / z2, -x / z2);
		let theta = x.atan2(r);

		let d_parallel = g / b.abs();
		let d_series = r / x.abs();

		match function {
			CPD  => (b / w, d_parallel),
			CPQ  => (b / w, 1.0 / d_parallel),
			CPG  => (b / w, g),
			CPRP => (b / w, 1.0 / g),
			CSD  => (-1.0 / (w * x), d_series),
			CSQ  => (-1.0 / (w * x), 1.0 / d_series),
			CSRS => (-1.0 / (w * x), r),
			LPD  => (-1.0 / (w * b), d_parallel),
			LPQ  => (-1.0 / (w * b), 1.0 / d_parallel),
			LPG  => (-1.0 / (w * b), g),
			LPRP => (-1.0 / (w * b), 1.0 / g),
			LSD  => (x / w, d_series),
			LSQ  => (x / w, 1.0 / d_series),
			LSRS => (x / w, r),
			RX   => (r, x),
			ZTD  => (z2.sqrt(), theta.to_degrees()),
			ZTR  => (z2.sqrt(), theta),
			GB   => (g, b),
			YTD  => (1.0 / z2.sqrt(), -theta.to_degrees()),
			YTR  => (1.0 / z2.sqrt(), -theta),
		}
	}

}

pub struct MockMeter {
	pub dut: SeriesRlc,
	pub function: MeasurementType,
	pub frequency_hz: f64,
	pub voltage: f64,
	commands: Vec<String>,
	fixed_reply: Option<String>,
	fail_after: Option<usize>,
}

impl Default for MockMeter {
	fn default() -> Self {
		MockMeter::new(SeriesRlc::default())
	}
}

fn signed(x: f64) -> String {
	let s = format_exp(x, 5);
	if s.starts_with('-') { s } else { format!("+{}", s) }
}

impl MockMeter {

	/// Power-on state of the meter: Z-theta at 1 kHz, 1 V.
	pub fn new(dut: SeriesRlc) -> Self {
		MockMeter {
			dut,
			function: MeasurementType::ZTD,
			frequency_hz: 1000.0,
			voltage: 1.0,
			commands: vec![],
			fixed_reply: None,
			fail_after: None,
		}
	}

	/// Answer every `fetch?` with `reply` instead of simulating a measurement.
	pub fn with_reply(mut self, reply: &str) -> Self {
		self.fixed_reply = Some(reply.to_owned());
		self
	}

	/// Time out on every command after the first `n`.
	pub fn fail_after(mut self, n: usize) -> Self {
		self.fail_after = Some(n);
		self
	}

	/// Every command accepted so far, in order.
	pub fn commands(&self) -> &[String] { &self.commands }

	fn fetch(&self) -> String {
		if let Some(reply) = &self.fixed_reply {
			return reply.clone();
		}
		let (primary, secondary) = self.dut.measure(self.function, self.frequency_hz);
		// Third field is the meter's status word
		format!("{},{},+0", signed(primary), signed(secondary))
	}

	fn handle(&mut self, command: &str) -> io::Result<Option<String>> {
		if let Some(n) = self.fail_after {
			if self.commands.len() >= n {
				return Err(Error::new(ErrorKind::TimedOut, "Simulated meter stopped responding"));
			}
		}
		self.commands.push(command.to_owned());

		let command = command.trim();
		let (head, arg) = match command.find(char::is_whitespace) {
			Some(i) => (&command[..i], command[i..].trim()),
			None => (command, ""),
		};
		let head = head.to_ascii_uppercase();

		match head.as_str() {
			"*IDN?" => Ok(Some(MOCK_IDN.to_owned())),
			"FETCH?" | "FETC?" => Ok(Some(self.fetch())),
			"FUNC:IMP" => {
				match MeasurementType::from_code(arg) {
					Some(m) => self.function = m,
					None => warn!("Simulated meter ignoring unknown function {:?}", arg),
				}
				Ok(None)
			},
			"FREQ" => {
				self.frequency_hz = parse_quantity(arg, "HZ")?;
				Ok(None)
			},
			"VOLT" => {
				self.voltage = parse_quantity(arg, "V")?;
				Ok(None)
			},
			_ => {
				debug!("Simulated meter ignoring {:?}", command);
				Ok(None)
			},
		}
	}

}

fn parse_quantity(arg: &str, unit: &str) -> io::Result<f64> {
	let upper = arg.to_ascii_uppercase();
	let number = upper.strip_suffix(unit).unwrap_or(&upper).trim();
	number.parse::<f64>()
		.map_err(|_| Error::new(ErrorKind::InvalidInput, format!("Simulated meter cannot parse {:?}", arg)))
}

impl Transport for MockMeter {

	fn send(&mut self, command: &str) -> io::Result<()> {
		self.handle(command).map(|_| ())
	}

	fn query(&mut self, command: &str) -> io::Result<String> {
		match self.handle(command)? {
			Some(response) => Ok(response),
			None => Err(Error::new(ErrorKind::TimedOut, format!("No response to {:?}", command))),
		}
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: f64, b: f64) -> bool { ((a - b) / b).abs() < 1e-9 }

	#[test]
	fn capacitor_reads_back_its_value() {
		let dut = SeriesRlc::default();
		let (cs, rs) = dut.measure(MeasurementType::CSRS, 1000.0);
		assert!(close(cs, 100e-9));
		assert!(close(rs, 50.0));

		let (_, theta) = dut.measure(MeasurementType::ZTD, 1000.0);
		assert!(theta < 0.0 && theta > -90.0);
	}

	#[test]
	fn inductor_reads_back_its_value() {
		let dut = SeriesRlc{ r_ohms: 2.0, l_henries: 1e-3, c_farads: 0.0 };
		let (ls, q) = dut.measure(MeasurementType::LSQ, 10_000.0);
		assert!(close(ls, 1e-3));
		assert!(close(q, 2.0 * PI * 10_000.0 * 1e-3 / 2.0));
	}

	#[test]
	fn tracks_settings_and_records_commands() {
		let mut meter = MockMeter::default();
		meter.send("FUNC:IMP rx").unwrap();
		meter.send("FREQ 2000Hz").unwrap();
		meter.send("VOLT 0.5 V").unwrap();
		assert_eq!(meter.function, MeasurementType::RX);
		assert_eq!(meter.frequency_hz, 2000.0);
		assert_eq!(meter.voltage, 0.5);

		let reply = meter.query("fetch?").unwrap();
		assert_eq!(reply.split(',').count(), 3);
		assert!(reply.starts_with("+5.00000e+01,-"));
		assert_eq!(meter.commands().len(), 4);
	}

	#[test]
	fn scripted_reply_and_failure() {
		let mut meter = MockMeter::default().with_reply("1,2").fail_after(1);
		assert_eq!(meter.query("fetch?").unwrap(), "1,2");
		let e = meter.send("FREQ 100Hz").unwrap_err();
		assert_eq!(e.kind(), ErrorKind::TimedOut);
		assert_eq!(meter.commands().len(), 1);
	}

	#[test]
	fn query_without_answer_times_out() {
		let mut meter = MockMeter::default();
		assert_eq!(meter.query("VOLT 1 V").unwrap_err().kind(), ErrorKind::TimedOut);
	}
}
