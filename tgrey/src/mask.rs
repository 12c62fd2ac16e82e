use std::net::IpAddr;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
#[error("'{0}' is not a valid IPv4 or IPv6 address")]
pub struct InvalidAddress(pub String);

/// Shorten a DNS name to the domain its mail farm is registered under, so
/// mx1.mail.example.com and mx7.mail.example.com collapse onto the same
/// triplet. Walks back from the last dot; a name with fewer than two dots
/// is returned unchanged.
pub fn shorten_name(name: &str) -> &str {
	let last = match name.rfind('.') {
		Some(pos) if pos > 0 => pos,
		_ => return name,
	};

	let mut pos = match name[..last].rfind('.') {
		Some(pos) if pos > 0 => pos,
		_ => return name,
	};

	// A tail of seven characters or less after the second-to-last dot is
	// likely a country-code second-level domain the way co.uk or com.au
	// are, so keep one more label: mail.example.co.uk should come out as
	// example.co.uk and not co.uk.
	if name.len() - pos <= 7 {
		pos = match name[..pos].rfind('.') {
			Some(prev) if prev > 0 => prev,
			_ => return name,
		};
	}

	&name[pos + 1..]
}

/// Mask a numeric IPv4 or IPv6 address down to the configured prefix and
/// render it as lowercase hex of every address byte, zeroed bits included.
/// That keeps v4 keys at 8 characters and v6 keys at 32 regardless of the
/// prefix length.
pub fn mask_address(address: &str, v4mask: u32, v6mask: u32) -> Result<String, InvalidAddress> {
	let ip: IpAddr = address
		.parse()
		.map_err(|_| InvalidAddress(address.to_owned()))?;

	let (mut bytes, mask) = match ip {
		IpAddr::V4(v4) => (v4.octets().to_vec(), v4mask),
		IpAddr::V6(v6) => (v6.octets().to_vec(), v6mask),
	};

	// keep the first `mask` bits; a prefix on a byte boundary leaves the
	// boundary byte alone and zeroes everything after it
	let boundary = (mask / 8) as usize;
	if boundary < bytes.len() {
		let keep = mask % 8;
		bytes[boundary] &= if keep == 0 { 0 } else { 0xff << (8 - keep) };
		for byte in &mut bytes[boundary + 1..] {
			*byte = 0;
		}
	}

	let mut hex = String::with_capacity(bytes.len() * 2);
	for byte in &bytes {
		hex.push_str(&format!("{:02x}", byte));
	}

	Ok(hex)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn shorten_plain_tld() {
		assert_eq!(shorten_name("mx1.mail.example.com"), "example.com");
		assert_eq!(shorten_name("mail.example.com"), "example.com");
	}

	#[test]
	fn shorten_ccsld() {
		assert_eq!(shorten_name("mx1.mail.example.co.uk"), "example.co.uk");
		assert_eq!(shorten_name("mail.example.com.au"), "example.com.au");
	}

	#[test]
	fn shorten_leaves_short_names_alone() {
		assert_eq!(shorten_name("example.com"), "example.com");
		assert_eq!(shorten_name("localhost"), "localhost");
		assert_eq!(shorten_name("co.uk"), "co.uk");
		assert_eq!(shorten_name("a.co.uk"), "a.co.uk");
	}

	#[test]
	fn shorten_bails_on_leading_dot() {
		assert_eq!(shorten_name(".com"), ".com");
		assert_eq!(shorten_name(".example.com"), ".example.com");
	}

	#[test]
	fn mask_v4_full_prefix() {
		assert_eq!(mask_address("203.0.113.5", 32, 128).unwrap(), "cb007105");
	}

	#[test]
	fn mask_v4_shorter_prefixes() {
		assert_eq!(mask_address("203.0.113.5", 24, 128).unwrap(), "cb007100");
		assert_eq!(mask_address("203.0.113.5", 25, 128).unwrap(), "cb007100");
		assert_eq!(mask_address("203.0.113.129", 25, 128).unwrap(), "cb007180");
		assert_eq!(mask_address("203.0.113.5", 0, 128).unwrap(), "00000000");
	}

	#[test]
	fn mask_v6() {
		assert_eq!(
			mask_address("::1", 32, 128).unwrap(),
			"00000000000000000000000000000001"
		);
		assert_eq!(
			mask_address("2001:db8::1", 32, 64).unwrap(),
			"20010db8000000000000000000000000"
		);
	}

	#[test]
	fn mask_is_lowercase() {
		assert_eq!(
			mask_address("2001:DB8::FF", 32, 128).unwrap(),
			"20010db80000000000000000000000ff"
		);
	}

	#[test]
	fn mask_is_idempotent() {
		let masked = mask_address("203.0.113.77", 24, 128).unwrap();
		// re-reading the masked form is not possible (it is hex, not dotted
		// quad), so idempotence means masking the already-masked address
		let again = mask_address("203.0.113.0", 24, 128).unwrap();
		assert_eq!(masked, again);
	}

	#[test]
	fn mask_rejects_non_addresses() {
		assert!(mask_address("unknown", 32, 128).is_err());
		assert!(mask_address("203.0.113.256", 32, 128).is_err());
		assert!(mask_address("example.com", 32, 128).is_err());
		assert!(mask_address("", 32, 128).is_err());
	}
}
