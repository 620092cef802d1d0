
use std::io::{self, Read, Write, Error, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};
use log::trace;

use crate::xdr;
use super::{xdr_pack, xdr_unpack};

const LAST_FRAGMENT:u32 = 0x8000_0000;

pub struct TcpClient {
	stream: TcpStream,
	pub prog: u32,
	pub vers: u32,
	pub lastxid: u32,
	pub packer: xdr::Packer,
	pub unpacker: xdr::Unpacker,
}

impl TcpClient {

	pub fn connect<A: ToSocketAddrs>(addr: A, prog: u32, vers: u32, timeout: Duration) -> io::Result<Self> {
		let addr = addr.to_socket_addrs()?.next()
			.ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Host did not resolve to any address"))?;
		let stream = TcpStream::connect_timeout(&addr, timeout)?;
		stream.set_read_timeout(Some(timeout))?;
		stream.set_write_timeout(Some(timeout))?;
		stream.set_nodelay(true)?;

		Ok(Self{ stream, prog, vers, lastxid: 0, packer: xdr::Packer::new(), unpacker: xdr::Unpacker::new() })
	}

	/// Resets the packer and writes the call header for `prc`; arguments get packed after this.
	pub fn start_call(&mut self, prc:u32) -> io::Result<()> {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader_no_auth(&mut self.packer, self.lastxid, self.prog, self.vers, prc)
	}

	/// Sends the packed call as a single record and loads the matching reply into the unpacker,
	/// positioned just past the reply header.
	pub fn do_call(&mut self) -> io::Result<()> {
		let call:&[u8] = self.packer.as_bytes();

		let mut send_bytes:Vec<u8> = Vec::with_capacity(call.len() + 4);
		send_bytes.write_u32::<BigEndian>(call.len() as u32 | LAST_FRAGMENT)?;
		send_bytes.extend_from_slice(call);
		self.stream.write_all(&send_bytes)?;
		trace!("rpc call xid={} prog={} ({} bytes)", self.lastxid, self.prog, call.len());

		loop {
			let reply = self.read_record()?;
			self.unpacker.reset(&reply);

			let xid = xdr_unpack::unpack_replyheader(&mut self.unpacker)?;
			if xid == self.lastxid {
				return Ok(());
			} else if xid < self.lastxid {
				// Stale reply to an earlier call that timed out
				continue;
			} else {
				return Err(Error::new(ErrorKind::InvalidData, "Reply xid is ahead of the last call"));
			}
		}
	}

	fn read_record(&mut self) -> io::Result<Vec<u8>> {
		let mut record:Vec<u8> = vec![];
		let mut last:bool = false;
		while !last {
			let marker:u32 = self.stream.read_u32::<BigEndian>()?;
			last = (marker & LAST_FRAGMENT) != 0;

			let n = (marker & !LAST_FRAGMENT) as usize;
			let start = record.len();
			record.resize(start + n, 0);
			self.stream.read_exact(&mut record[start..])?;
		}
		Ok(record)
	}

}
