//! Renderers that turn embedded content into source literals for code
//! generators.

use std::io;
use std::io::Write;

/// Render `data` as a comma separated list of decimal byte values, the body
/// of a `[]byte{...}` literal.
pub fn bytes_to_list(data: &[u8]) -> String {
	data.iter()
		.map(u8::to_string)
		.collect::<Vec<_>>()
		.join(",")
}

/// Render `data` as `\x..` escapes for use inside a double quoted string.
pub fn bytes_to_hex(data: &[u8]) -> String {
	let mut rendered = String::with_capacity(data.len() * 4);
	for pair in hex::encode(data).as_bytes().chunks(2) {
		rendered.push_str("\\x");
		rendered.extend(pair.iter().map(|digit| char::from(*digit)));
	}
	rendered
}

/// Write `data` as `\x..` escapes and return the number of bytes escaped.
pub fn write_hex<W: Write>(data: &[u8], writer: &mut W) -> io::Result<usize> {
	let mut escape = *b"\\x00";

	for byte in data {
		hex::encode_to_slice([*byte], &mut escape[2..]).map_err(io::Error::other)?;
		writer.write_all(&escape)?;
	}

	Ok(data.len())
}
