//! The `key = value` configuration file naming the instrument and the default sweep.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::measurement::MeasurementType;
use crate::utils::format_voltage;

/// Quasi-logarithmic frequency sweep covering the meter's full range.
pub const FREQ_QLOG_RANGE: [i64; 12] = [
	100, 200, 500,
	1000, 2000, 5000,
	10000, 20000, 50000,
	100000, 200000, 500000,
];

const PREAMBLE: &str = "\
# Auto-generated configuration file for a frequency sweep.
# Frequencies are provided in Hz. Feel free to change, but
# respect the range (1 Hz - 500 kHz) of the equipment. AC
# voltage can be varied up to 2 V (0 V excluded). The first
# voltage is used for frequency sweeps, the first frequency
# for amplitude sweeps. Do not change the keywords.
";

/// Values written into a freshly generated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
	pub frequencies: Vec<i64>,
	pub voltage: f64,
	pub measurement: MeasurementType,
}

impl Default for Defaults {
	fn default() -> Self {
		Defaults {
			frequencies: FREQ_QLOG_RANGE.to_vec(),
			voltage: 0.5,
			measurement: MeasurementType::ZTD,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
	pub device: String,
	pub frequencies: Vec<i64>,
	/// The first entry is the AC level used by frequency sweeps.
	pub voltages: Vec<f64>,
	/// Kept as written; checked when a sweep is requested.
	pub measurement: String,
}

impl Configuration {

	pub fn fresh(device: &str, defaults: &Defaults) -> Configuration {
		Configuration {
			device: device.to_owned(),
			frequencies: defaults.frequencies.clone(),
			voltages: vec![defaults.voltage],
			measurement: defaults.measurement.code().to_owned(),
		}
	}

	pub fn encode(&self) -> String {
		let join = |items: Vec<String>| items.join(", ");

		let mut text = String::from(PREAMBLE);
		text.push_str(&format!("device = {}\n", self.device));
		text.push_str(&format!("freq = {}\n", join(self.frequencies.iter().map(|f| f.to_string()).collect())));
		text.push_str(&format!("voltage = {}\n", join(self.voltages.iter().map(|&v| format_voltage(v)).collect())));
		text.push_str(&format!("measurement = {}\n", self.measurement));
		text
	}

	/// Scans every line for the four keys; order does not matter and anything else is ignored.
	/// All four must end up with a value.
	pub fn decode(text: &str) -> Result<Configuration> {
		let mut device = String::new();
		let mut frequencies: Vec<i64> = vec![];
		let mut voltages: Vec<f64> = vec![];
		let mut measurement = String::new();

		for line in text.lines() {
			if line.trim_start().starts_with('#') { continue; }

			let mut parts = line.split('=');
			let key = parts.next().unwrap_or("").trim();
			let value = match parts.next() {
				Some(v) => v.trim(),
				None => continue,
			};

			match key {
				"device" => device = value.to_owned(),
				"freq" => frequencies = parse_list(value, "freq")?,
				"voltage" => voltages = parse_list(value, "voltage")?,
				"measurement" => measurement = value.to_owned(),
				_ => debug!("Ignoring configuration line {:?}", line),
			}
		}

		let mut missing = vec![];
		if device.is_empty() { missing.push("device"); }
		if frequencies.is_empty() { missing.push("freq"); }
		if voltages.is_empty() { missing.push("voltage"); }
		if measurement.is_empty() { missing.push("measurement"); }
		if !missing.is_empty() {
			return Err(Error::IncompleteConfiguration(missing));
		}

		Ok(Configuration{ device, frequencies, voltages, measurement })
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Configuration> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
		Configuration::decode(&text)
	}

	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		fs::write(path, self.encode()).map_err(|e| Error::io(path, e))?;
		info!("Configuration saved as {}", path.display());
		Ok(())
	}

}

fn parse_list<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<Vec<T>> {
	if value.is_empty() {
		return Ok(vec![]);
	}
	value.split(',')
		.map(|item| {
			let item = item.trim();
			item.parse::<T>().map_err(|_| Error::InvalidConfigValue{ key, value: item.to_owned() })
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_file_layout() {
		let cfg = Configuration::fresh("TCPIP0::10.0.0.2::inst0::INSTR", &Defaults::default());
		let text = cfg.encode();
		assert!(text.starts_with("# Auto-generated"));

		let keys: Vec<&str> = text.lines()
			.filter(|l| !l.starts_with('#'))
			.collect();
		assert_eq!(keys, vec![
			"device = TCPIP0::10.0.0.2::inst0::INSTR",
			"freq = 100, 200, 500, 1000, 2000, 5000, 10000, 20000, 50000, 100000, 200000, 500000",
			"voltage = 0.5",
			"measurement = ZTD",
		]);
	}

	#[test]
	fn round_trip() {
		let cfg = Configuration {
			device: "meter.lab".to_owned(),
			frequencies: vec![1, 42, 500000],
			voltages: vec![0.1, 0.30000000000000004, 2.0],
			measurement: "cprp".to_owned(),
		};
		assert_eq!(Configuration::decode(&cfg.encode()).unwrap(), cfg);
		assert!(cfg.encode().contains("voltage = 0.1, 0.30000000000000004, 2.0\n"));
	}

	#[test]
	fn order_free_and_ignores_noise() {
		let text = "measurement=LSQ\n\
			some other line\n\
			voltage = 1.5, 0.2\n\
			# device = commented\n\
			freq=10,20\n\
			device =  10.0.0.3  \n";
		let cfg = Configuration::decode(text).unwrap();
		assert_eq!(cfg.device, "10.0.0.3");
		assert_eq!(cfg.frequencies, vec![10, 20]);
		assert_eq!(cfg.voltages, vec![1.5, 0.2]);
		assert_eq!(cfg.measurement, "LSQ");
	}

	#[test]
	fn missing_keys_are_reported_together() {
		match Configuration::decode("device = x\nvoltage =\n") {
			Err(Error::IncompleteConfiguration(missing)) => assert_eq!(missing, vec!["freq", "voltage", "measurement"]),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn bad_list_item() {
		match Configuration::decode("device = x\nfreq = 100, 2k\nvoltage = 0.5\nmeasurement = ZTD\n") {
			Err(Error::InvalidConfigValue{ key, value }) => {
				assert_eq!(key, "freq");
				assert_eq!(value, "2k");
			},
			other => panic!("unexpected {:?}", other),
		}
	}
}
