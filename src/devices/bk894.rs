
use std::io::{self, ErrorKind};
use std::time::Duration;

use lazy_static::lazy_static;
use log::{info, warn};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::sweep::{self, SweepRequest, SweepResult};
use crate::transport::{Transport, Vxi11Session};

lazy_static! {
	static ref IDN_RE: Regex = Regex::new(r"^\s*([^,]+),([^,]+),([^,]+),([^,]+)(?:,([^,]+))?").unwrap();
}

pub const EXPECTED_MODEL: &str = "894";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
	pub manufacturer: String,
	pub model: String,
	pub series: String,
	pub firmware: String,
	pub hardware: Option<String>,
}

fn capture(caps:&Captures, idx:usize) -> Option<String> {
	caps.get(idx).map(|m| m.as_str().trim().to_owned())
}

impl Identity {

	pub fn parse(idn:&str) -> io::Result<Identity> {
		let err = || io::Error::new(ErrorKind::InvalidData, format!("Unrecognized *IDN? response: {:?}", idn));
		let caps = IDN_RE.captures(idn).ok_or_else(err)?;

		Ok(Identity {
			manufacturer: capture(&caps, 1).ok_or_else(err)?,
			model:        capture(&caps, 2).ok_or_else(err)?,
			series:       capture(&caps, 3).ok_or_else(err)?,
			firmware:     capture(&caps, 4).ok_or_else(err)?,
			hardware:     capture(&caps, 5),
		})
	}

	pub fn banner(&self) -> Vec<String> {
		let rule = "-".repeat(42);
		vec![
			"Device information".to_owned(),
			rule.clone(),
			format!("Manufacturer : {}", self.manufacturer),
			format!("Model        : {}", self.model),
			format!("Series       : {}", self.series),
			format!("Firmware     : {}", self.firmware),
			format!("Hardware     : {}", self.hardware.as_deref().unwrap_or("-")),
			rule,
		]
	}

}

pub struct BK894<T: Transport> {
	link: T,
	pub identity: Identity,
}

impl BK894<Vxi11Session> {

	pub fn connect(resource:&str, timeout:Duration) -> Result<Self> {
		let session = Vxi11Session::open(resource, timeout)?;
		info!("Connected to {}", session.resource().to_visa_string());
		BK894::new(session)
	}

}

impl<T: Transport> BK894<T> {

	/// Identifies the instrument on the other end of `link`.
	pub fn new(mut link:T) -> Result<Self> {
		let idn = link.query("*IDN?")?;
		let identity = Identity::parse(&idn)
			.map_err(|e| Error::MalformedResponse{ response: idn.clone(), reason: e.to_string() })?;
		if identity.model.trim() != EXPECTED_MODEL {
			warn!("Expected a model {} meter but found {} {}", EXPECTED_MODEL, identity.manufacturer, identity.model);
		}
		Ok(Self{ link, identity })
	}

	pub fn sweep(&mut self, request:&SweepRequest) -> Result<SweepResult> {
		sweep::run_sweep(&mut self.link, request)
	}

	/// Repeats `request` `runs` times, see [`sweep::run_batch`].
	pub fn sweep_batch<E, F>(&mut self, request:&SweepRequest, runs:usize, record:F) -> std::result::Result<usize, E>
	where E: From<Error>, F: FnMut(usize, &SweepResult) -> std::result::Result<(), E>
	{
		sweep::run_batch(&mut self.link, request, runs, record)
	}

	pub fn into_inner(self) -> T { self.link }

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn five_field_idn() {
		let id = Identity::parse("B&K Precision, 894, 3490123, V1.2.3, V1.0\n").unwrap();
		assert_eq!(id.manufacturer, "B&K Precision");
		assert_eq!(id.model, "894");
		assert_eq!(id.series, "3490123");
		assert_eq!(id.firmware, "V1.2.3");
		assert_eq!(id.hardware.as_deref(), Some("V1.0"));
	}

	#[test]
	fn hardware_field_is_optional() {
		let id = Identity::parse("Siglent,SDG2042X,SDG2XABC,2.01").unwrap();
		assert_eq!(id.hardware, None);
		assert_eq!(id.banner()[6], "Hardware     : -");
	}

	#[test]
	fn garbage_idn() {
		assert!(Identity::parse("hello").is_err());
	}
}
