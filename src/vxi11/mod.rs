
// Device core
pub const DEVICE_CORE_PROG:u32  = 0x0607af;
pub const DEVICE_CORE_VERS:u32  = 1;
pub const CREATE_LINK:u32       = 10;
pub const DEVICE_WRITE:u32      = 11;
pub const DEVICE_READ:u32       = 12;
pub const DESTROY_LINK:u32      = 23;

pub const CLIENT_ID:i32 = 3333;
pub const DEFAULT_LOCK_TIMEOUT:u32 = 10000;

pub const OPERATION_FLAGS_END_ONLY:i32 = 8;

// Reason bits of a device_read reply
pub const REASON_REQCNT:i32 = 1;
pub const REASON_CHR:i32    = 2;
pub const REASON_END:i32    = 4;

use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use log::debug;

use crate::rpc::IPPROTO_TCP;
use crate::rpc::port_mapping::{TcpPortMapperClient, Mapping};
use crate::rpc::tcp_clients::TcpClient;

pub mod xdr_pack;

fn err(msg:&str) -> io::Error { Error::new(ErrorKind::Other, msg) }

fn device_error(code:i32) -> io::Error {
	match code {
		1  => err("Syntax error"),
		3  => err("Device not accessible"),
		4  => err("Invalid link identifier"),
		5  => err("Parameter error"),
		9  => err("Out of resources"),
		11 => err("Device locked by another link"),
		15 => Error::new(ErrorKind::TimedOut, "I/O timeout"),
		17 => err("I/O error"),
		21 => err("Invalid address"),
		23 => err("Abort"),
		_  => err("Unknown device error"),
	}
}

pub struct CoreClient {
	client: TcpClient,
	opt_link: Option<Link>,
	io_timeout_ms: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Link {
	pub link_id: i32,
	pub max_recv_size: u32,
}

impl CoreClient {

	fn get_link(&self) -> io::Result<Link> {
		self.opt_link.ok_or_else(|| Error::new(ErrorKind::NotConnected, "No link"))
	}

	/// Looks up the core channel through the host's port mapper and connects to it.
	pub fn new(host:&str, timeout:Duration) -> io::Result<Self> {
		let mapping = Mapping {
			program: DEVICE_CORE_PROG,
			version: DEVICE_CORE_VERS,
			protocol: IPPROTO_TCP,
			port: 0,
		};
		let port = TcpPortMapperClient::new(host, timeout)?.get_port(&mapping)?;
		debug!("VXI-11 core channel of {} is on port {}", host, port);

		// The instrument gets the full timeout, the socket waits a little longer for its answer
		let client = TcpClient::connect((host, port), DEVICE_CORE_PROG, DEVICE_CORE_VERS, timeout + Duration::from_secs(1))?;
		let io_timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;

		Ok(CoreClient{ client, opt_link: None, io_timeout_ms })
	}

	pub fn create_link(&mut self, device:&str) -> io::Result<()> {
		if self.opt_link.is_some() {
			return Err(err("Already connected to a link"));
		}

		self.client.start_call(CREATE_LINK)?;
		xdr_pack::pack_create_link_parms(&mut self.client.packer, CLIENT_ID, false, DEFAULT_LOCK_TIMEOUT, device)?;
		self.client.do_call()?;

		let error:i32         = self.client.unpacker.unpack_i32()?;
		let link_id:i32       = self.client.unpacker.unpack_i32()?;
		self.client.unpacker.unpack_u32()?;	// abort port, there is no abort channel
		let max_recv_size:u32 = self.client.unpacker.unpack_u32()?;

		if error != 0 { return Err(device_error(error)); }

		debug!("Created link {} to {} (max_recv_size={})", link_id, device, max_recv_size);
		self.opt_link = Some(Link{ link_id, max_recv_size });
		Ok(())
	}

	pub fn write(&mut self, data:&[u8]) -> io::Result<()> {
		let Link{ link_id, max_recv_size } = self.get_link()?;
		if data.len() > max_recv_size as usize {
			return Err(Error::new(ErrorKind::InvalidInput, "Command is longer than the instrument accepts in one write"));
		}

		self.client.start_call(DEVICE_WRITE)?;
		xdr_pack::pack_device_write_parms(&mut self.client.packer, link_id, self.io_timeout_ms, DEFAULT_LOCK_TIMEOUT, OPERATION_FLAGS_END_ONLY, data)?;
		self.client.do_call()?;

		let error:i32 = self.client.unpacker.unpack_i32()?;
		let size:u32  = self.client.unpacker.unpack_u32()?;

		if error != 0 { return Err(device_error(error)); }
		if size as usize != data.len() {
			return Err(err("Number of bytes in confirmation doesn't match number of bytes sent"));
		}
		Ok(())
	}

	/// Reads until the instrument flags the end of its message.
	pub fn read(&mut self) -> io::Result<Vec<u8>> {
		let link_id:i32 = self.get_link()?.link_id;
		let mut ans:Vec<u8> = vec![];

		loop {
			self.client.start_call(DEVICE_READ)?;
			xdr_pack::pack_device_read_parms(&mut self.client.packer, link_id, u32::MAX, self.io_timeout_ms, DEFAULT_LOCK_TIMEOUT, 0, 0)?;
			self.client.do_call()?;

			let error:i32    = self.client.unpacker.unpack_i32()?;
			let reason:i32   = self.client.unpacker.unpack_i32()?;
			let data:Vec<u8> = self.client.unpacker.unpack_variable_len_opaque()?;

			if error != 0 { return Err(device_error(error)); }
			ans.extend_from_slice(&data);

			if reason & REASON_END != 0 {
				return Ok(ans);
			} else if reason & (REASON_REQCNT | REASON_CHR) == 0 {
				return Err(err("Read ended without any reason bit set"));
			}
		}
	}

	pub fn destroy_link(&mut self) -> io::Result<()> {
		let link_id:i32 = self.get_link()?.link_id;

		self.client.start_call(DESTROY_LINK)?;
		self.client.packer.pack_i32(link_id)?;
		self.client.do_call()?;
		self.opt_link = None;

		match self.client.unpacker.unpack_i32()? {
			0 => Ok(()),
			e => Err(device_error(e)),
		}
	}

}
