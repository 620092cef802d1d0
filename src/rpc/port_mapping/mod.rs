
pub const PMAP_PROG:u32 = 100000;
pub const PMAP_VERS:u32 = 2;
pub const PMAP_PORT:u16 = 111;

pub const PMAPPROC_GETPORT:u32 = 3;     // (mapping) -> unsigned int

use std::io::{self, Error, ErrorKind};
use std::net::SocketAddr;
use std::time::Duration;

use super::xdr_pack;
use super::tcp_clients::TcpClient;
use super::udp_clients::BroadcastUdpClient;

#[derive(Debug, Clone, Copy)]
pub struct Mapping {
	pub program: u32,
	pub version: u32,
	pub protocol: u32,			// IPPROTO_*
	pub port: u32,
}

pub struct TcpPortMapperClient {
	client: TcpClient,
}

impl TcpPortMapperClient {

	pub fn new(host:&str, timeout:Duration) -> io::Result<Self> {
		let client = TcpClient::connect((host, PMAP_PORT), PMAP_PROG, PMAP_VERS, timeout)?;
		Ok(Self{ client })
	}

	pub fn get_port(&mut self, m:&Mapping) -> io::Result<u16> {
		self.client.start_call(PMAPPROC_GETPORT)?;
		xdr_pack::pack_mapping(&mut self.client.packer, m.program, m.version, m.protocol, m.port)?;
		self.client.do_call()?;

		let port:u32 = self.client.unpacker.unpack_u32()?;
		if !self.client.unpacker.all_data_consumed() {
			return Err(Error::new(ErrorKind::InvalidData, "Data unexpectedly left over after unpacking port"));
		}
		match port {
			0 => Err(Error::new(ErrorKind::NotFound, format!("Program {} is not registered with the port mapper", m.program))),
			p if p > u16::MAX as u32 => Err(Error::new(ErrorKind::InvalidData, "Port mapper returned an out of range port")),
			p => Ok(p as u16),
		}
	}

}

/// Asks every port mapper on the local broadcast domain where `m.program` lives and returns the
/// addresses of those that have it registered.
pub fn broadcast_get_port(m:&Mapping, timeout:Duration) -> io::Result<Vec<SocketAddr>> {
	let mut client = BroadcastUdpClient::bind(PMAP_PORT, PMAP_PROG, PMAP_VERS)?;
	client.start_call(PMAPPROC_GETPORT)?;
	xdr_pack::pack_mapping(&mut client.packer, m.program, m.version, m.protocol, m.port)?;

	let mut found:Vec<SocketAddr> = vec![];
	for (addr, mut unpacker) in client.make_call(timeout)? {
		if let Ok(port) = unpacker.unpack_u32() {
			if port != 0 && !found.contains(&addr) {
				found.push(addr);
			}
		}
	}
	Ok(found)
}
