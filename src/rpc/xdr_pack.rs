
use std::io;

use crate::xdr::Packer;
use crate::rpc::{CALL, RPCVERSION};

const AUTH_NONE:i32 = 0;

pub fn pack_auth(packer:&mut Packer, flavor:i32, stuff:&[u8]) -> io::Result<()> {
	packer.pack_enum(flavor)?;
	packer.pack_variable_len_opaque(stuff)
}

pub fn pack_callheader_no_auth(packer:&mut Packer, xid:u32, prog:u32, vers:u32, prc:u32) -> io::Result<()> {
	packer.pack_u32(xid)?;
	packer.pack_enum(CALL)?;
	packer.pack_u32(RPCVERSION)?;
	packer.pack_u32(prog)?;
	packer.pack_u32(vers)?;
	packer.pack_u32(prc)?;
	pack_auth(packer, AUTH_NONE, &[])?;
	pack_auth(packer, AUTH_NONE, &[])
}

pub fn pack_mapping(packer:&mut Packer, prog:u32, vers:u32, prot:u32, port:u32) -> io::Result<()> {
	packer.pack_u32(prog)?;
	packer.pack_u32(vers)?;
	packer.pack_u32(prot)?;
	packer.pack_u32(port)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rpc::IPPROTO_TCP;
	use crate::vxi11::{DEVICE_CORE_PROG, DEVICE_CORE_VERS};

	#[test]
	fn core_channel_lookup_is_tcp_only() {
		let mut packer = Packer::new();
		pack_mapping(&mut packer, DEVICE_CORE_PROG, DEVICE_CORE_VERS, IPPROTO_TCP, 0).unwrap();
		assert_eq!(packer.as_bytes(), &[
			0x00, 0x06, 0x07, 0xaf,
			0x00, 0x00, 0x00, 0x01,
			0x00, 0x00, 0x00, 0x06,
			0x00, 0x00, 0x00, 0x00,
		][..]);
	}
}
