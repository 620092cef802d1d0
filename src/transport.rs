//! The command/response link to an instrument.
//!
//! The sweep engine only needs [`Transport`]; [`Vxi11Session`] provides it over the network.

use std::io::{self, Error, ErrorKind};
use std::str;
use std::time::Duration;

use log::{debug, warn};

use crate::rpc::IPPROTO_TCP;
use crate::rpc::port_mapping::{self, Mapping};
use crate::vxi11::{CoreClient, DEVICE_CORE_PROG, DEVICE_CORE_VERS};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_DEVICE: &str = "inst0";

/// Send a command, or send one and wait for the reply. One request is in flight at a time.
pub trait Transport {
	fn send(&mut self, command: &str) -> io::Result<()>;

	/// Returns the response with trailing line terminators removed.
	fn query(&mut self, command: &str) -> io::Result<String>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
	fn send(&mut self, command: &str) -> io::Result<()> { (**self).send(command) }
	fn query(&mut self, command: &str) -> io::Result<String> { (**self).query(command) }
}

/// A network instrument address, parsed from `TCPIP0::host::inst0::INSTR` or a bare host.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
	pub host: String,
	pub device: String,
}

impl Resource {

	pub fn parse(name: &str) -> io::Result<Resource> {
		let name = name.trim();
		let invalid = |msg: &str| Error::new(ErrorKind::InvalidInput, format!("{}: {:?}", msg, name));

		if !name.contains("::") {
			if name.is_empty() { return Err(invalid("Empty resource name")); }
			return Ok(Resource{ host: name.to_owned(), device: DEFAULT_DEVICE.to_owned() });
		}

		let parts: Vec<&str> = name.split("::").map(str::trim).collect();
		let interface = parts[0].to_ascii_uppercase();
		if !interface.starts_with("TCPIP") || !interface[5..].chars().all(|c| c.is_ascii_digit()) {
			return Err(invalid("Only TCPIP resources can be reached over VXI-11"));
		}

		let rest: &[&str] = match parts.last() {
			Some(last) if last.eq_ignore_ascii_case("INSTR") => &parts[1..parts.len() - 1],
			Some(last) if last.eq_ignore_ascii_case("SOCKET") => return Err(invalid("Raw socket resources are not supported")),
			_ => &parts[1..],
		};

		match rest {
			[host] if !host.is_empty() => Ok(Resource{ host: (*host).to_owned(), device: DEFAULT_DEVICE.to_owned() }),
			[host, device] if !host.is_empty() && !device.is_empty() => Ok(Resource{ host: (*host).to_owned(), device: (*device).to_owned() }),
			_ => Err(invalid("Malformed resource name")),
		}
	}

	pub fn to_visa_string(&self) -> String {
		format!("TCPIP0::{}::{}::INSTR", self.host, self.device)
	}

}

/// VXI-11 link to one instrument; the link is torn down on drop.
pub struct Vxi11Session {
	core: CoreClient,
	resource: Resource,
}

impl Vxi11Session {

	pub fn open(resource: &str, timeout: Duration) -> io::Result<Self> {
		let resource = Resource::parse(resource)?;
		let mut core = CoreClient::new(&resource.host, timeout)?;
		core.create_link(&resource.device)?;
		Ok(Self{ core, resource })
	}

	pub fn resource(&self) -> &Resource { &self.resource }

}

impl Transport for Vxi11Session {

	fn send(&mut self, command: &str) -> io::Result<()> {
		debug!("-> {}", command);
		let mut line = String::with_capacity(command.len() + 1);
		line.push_str(command);
		line.push('\n');
		self.core.write(line.as_bytes())
	}

	fn query(&mut self, command: &str) -> io::Result<String> {
		self.send(command)?;
		let raw = self.core.read()?;
		let response = str::from_utf8(&raw)
			.map_err(|_| Error::new(ErrorKind::InvalidData, "Unable to interpret response as UTF-8"))?
			.trim_end_matches(|c| c == '\n' || c == '\r')
			.to_owned();
		debug!("<- {}", response);
		Ok(response)
	}

}

impl Drop for Vxi11Session {

	fn drop(&mut self) {
		if let Err(e) = self.core.destroy_link() {
			warn!("Unable to destroy link to {}: {}", self.resource.host, e);
		}
	}

}

/// Broadcasts for VXI-11 instruments on the local network and returns their resource names.
pub fn discover(timeout: Duration) -> io::Result<Vec<String>> {
	let mapping = Mapping {
		program: DEVICE_CORE_PROG,
		version: DEVICE_CORE_VERS,
		protocol: IPPROTO_TCP,
		port: 0,
	};
	let found = port_mapping::broadcast_get_port(&mapping, timeout)?;
	debug!("Discovery found {} instrument(s)", found.len());

	Ok(found.into_iter()
		.map(|addr| Resource{ host: addr.ip().to_string(), device: DEFAULT_DEVICE.to_owned() }.to_visa_string())
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn res(host: &str, device: &str) -> Resource {
		Resource{ host: host.to_owned(), device: device.to_owned() }
	}

	#[test]
	fn visa_style_names() {
		assert_eq!(Resource::parse("TCPIP0::192.168.1.20::inst0::INSTR").unwrap(), res("192.168.1.20", "inst0"));
		assert_eq!(Resource::parse("tcpip::meter.lab::INSTR").unwrap(), res("meter.lab", "inst0"));
		assert_eq!(Resource::parse("TCPIP1::10.0.0.5::gpib0,3").unwrap(), res("10.0.0.5", "gpib0,3"));
	}

	#[test]
	fn bare_host() {
		assert_eq!(Resource::parse(" 10.0.0.7 ").unwrap(), res("10.0.0.7", "inst0"));
	}

	#[test]
	fn other_interfaces_are_rejected() {
		assert!(Resource::parse("USB0::0xFFFF::0x0894::123456::INSTR").is_err());
		assert!(Resource::parse("ASRL3::INSTR").is_err());
		assert!(Resource::parse("TCPIP0::10.0.0.5::5025::SOCKET").is_err());
		assert!(Resource::parse("TCPIP0::::INSTR").is_err());
		assert!(Resource::parse("").is_err());
	}

	#[test]
	fn visa_string_round_trip() {
		let r = res("10.0.0.9", "inst0");
		assert_eq!(Resource::parse(&r.to_visa_string()).unwrap(), r);
	}
}
