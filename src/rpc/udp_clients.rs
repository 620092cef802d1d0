
use std::io::{self, Error, ErrorKind};
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use log::debug;

use crate::xdr;
use super::{xdr_pack, xdr_unpack};

/// Sends one call to the broadcast address and gathers every reply that arrives before the timeout.
pub struct BroadcastUdpClient {
	socket: UdpSocket,
	pub prog: u32,
	pub vers: u32,
	pub port: u16,
	pub lastxid: u32,
	pub packer: xdr::Packer,
	recv_buff: [u8; 8192],
}

impl BroadcastUdpClient {

	pub fn bind(port:u16, prog: u32, vers: u32) -> io::Result<Self> {
		let socket:UdpSocket = UdpSocket::bind("0.0.0.0:0")?;
		socket.set_broadcast(true)?;

		Ok(Self{ socket, prog, vers, port, lastxid: 0, packer: xdr::Packer::new(), recv_buff: [0; 8192] })
	}

	pub fn start_call(&mut self, prc:u32) -> io::Result<()> {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader_no_auth(&mut self.packer, self.lastxid, self.prog, self.vers, prc)
	}

	/// Returns the sender and the undecoded results of each reply with a matching xid.
	pub fn make_call(&mut self, timeout: Duration) -> io::Result<Vec<(SocketAddr, xdr::Unpacker)>> {
		let call:&[u8] = self.packer.as_bytes();
		let n = self.socket.send_to(call, ("255.255.255.255", self.port))?;
		if n != call.len() {
			return Err(Error::new(ErrorKind::Other, "Sent the wrong number of bytes"));
		}

		let deadline = Instant::now() + timeout;
		let mut replies = vec![];
		loop {
			let left = deadline.saturating_duration_since(Instant::now());
			if left == Duration::from_millis(0) { break; }
			self.socket.set_read_timeout(Some(left))?;

			let (n, addr) = match self.socket.recv_from(&mut self.recv_buff) {
				Ok(x) => x,
				Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => break,
				Err(e) => return Err(e),
			};

			let mut unpacker = xdr::Unpacker::new();
			unpacker.reset(&self.recv_buff[..n]);
			match xdr_unpack::unpack_replyheader(&mut unpacker) {
				Ok(xid) if xid == self.lastxid => replies.push((addr, unpacker)),
				Ok(_)  => debug!("Ignoring stale broadcast reply from {}", addr),
				Err(e) => debug!("Ignoring unusable broadcast reply from {}: {}", addr, e),
			}
		}

		Ok(replies)
	}

}
