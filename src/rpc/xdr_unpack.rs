
use std::io::{self, Error, ErrorKind};

use crate::xdr::Unpacker;
use crate::rpc::{REPLY, MSG_DENIED, RPC_MISMATCH, AUTH_ERROR, MSG_ACCEPTED, PROG_UNAVAIL, PROG_MISMATCH, PROC_UNAVAIL, GARBAGE_ARGS, SUCCESS};

fn err(msg:&str) -> io::Error { Error::new(ErrorKind::Other, msg) }

/// Consumes an accepted, successful reply header and returns its xid.
/// Denied or failed calls come back as errors.
pub fn unpack_replyheader(unpacker:&mut Unpacker) -> io::Result<u32> {
	let xid:u32 = unpacker.unpack_u32()?;

	if unpacker.unpack_enum()? != REPLY { return Err(err("Expected REPLY message type")); }

	match unpacker.unpack_enum()? {
		MSG_ACCEPTED => { },
		MSG_DENIED => return match unpacker.unpack_enum()? {
			RPC_MISMATCH => Err(err("RPC call denied: RPC version mismatch")),
			AUTH_ERROR   => Err(err("RPC call denied: authentication error")),
			_            => Err(err("RPC call denied for an unknown reason")),
		},
		_ => return Err(err("Reply neither accepted nor denied")),
	}

	// Verifier, never used without authentication
	unpacker.unpack_enum()?;
	unpacker.unpack_variable_len_opaque()?;

	match unpacker.unpack_enum()? {
		SUCCESS       => Ok(xid),
		PROG_UNAVAIL  => Err(err("RPC program unavailable")),
		PROG_MISMATCH => Err(err("RPC program version mismatch")),
		PROC_UNAVAIL  => Err(err("RPC procedure unavailable")),
		GARBAGE_ARGS  => Err(err("RPC server could not decode arguments")),
		_             => Err(err("RPC call failed for an unknown reason")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::xdr::Packer;

	fn reply(xid:u32, accept_stat:i32) -> Vec<u8> {
		let mut p = Packer::new();
		p.pack_u32(xid).unwrap();
		p.pack_enum(REPLY).unwrap();
		p.pack_enum(MSG_ACCEPTED).unwrap();
		p.pack_enum(0).unwrap();
		p.pack_variable_len_opaque(&[]).unwrap();
		p.pack_enum(accept_stat).unwrap();
		p.pack_u32(1234).unwrap();
		p.as_bytes().to_vec()
	}

	#[test]
	fn accepted_reply_leaves_results() {
		let mut u = Unpacker::new();
		u.reset(&reply(7, SUCCESS));
		assert_eq!(unpack_replyheader(&mut u).unwrap(), 7);
		assert_eq!(u.unpack_u32().unwrap(), 1234);
	}

	#[test]
	fn failed_reply_is_an_error() {
		let mut u = Unpacker::new();
		u.reset(&reply(7, PROG_UNAVAIL));
		assert!(unpack_replyheader(&mut u).is_err());
	}
}
