use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::{
	mask::{mask_address, shorten_name, InvalidAddress},
	policy::Request,
	FIELD_SEPARATOR,
};

/// The (sender, recipient, client) combination a greylist entry is keyed
/// on. All three components are lowercase; the client is either a shortened
/// hostname or a masked address in hex.
#[derive(Clone, Debug, PartialEq)]
pub struct Triplet {
	sender: String,
	recipient: String,
	client: String,
}

impl Triplet {
	pub fn new<S: Into<String>>(sender: S, recipient: S, client: S) -> Self {
		Self {
			sender: sender.into().to_lowercase(),
			recipient: recipient.into().to_lowercase(),
			client: client.into().to_lowercase(),
		}
	}

	pub fn from_request(
		req: &Request,
		v4mask: u32,
		v6mask: u32,
	) -> Result<Self, TripletError> {
		// an empty sender is a bounce envelope and stays empty in the key
		let sender = match req.sender() {
			Some(sender) => sender.to_lowercase(),
			None => return Err(TripletError::MissingAttribute("sender")),
		};

		let recipient = match req.recipient() {
			Some(recipient) if !recipient.is_empty() => recipient.to_lowercase(),
			_ => return Err(TripletError::MissingAttribute("recipient")),
		};

		// Prefer the client hostname, shortened to its registered domain so
		// every host of one mail farm lands on the same triplet. Postfix
		// sends the literal "unknown" when reverse DNS failed; fall back to
		// the masked address then.
		let client = match req.client_name() {
			Some(name) => shorten_name(&name.to_lowercase()).to_owned(),
			None => match req.client_address() {
				Some(address) => mask_address(address, v4mask, v6mask)?,
				None => return Err(TripletError::MissingAttribute("client_address")),
			},
		};

		Ok(Self {
			sender,
			recipient,
			client,
		})
	}

	/// The storage key: the three components joined by the non-printable
	/// field separator.
	pub fn key(&self) -> String {
		format!(
			"{}{sep}{}{sep}{}",
			self.sender,
			self.recipient,
			self.client,
			sep = FIELD_SEPARATOR
		)
	}
}

/// The readable rendering used in log lines, never as a storage key.
impl Display for Triplet {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{} / {} / {}", self.sender, self.recipient, self.client)
	}
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TripletError {
	#[error("required attribute '{0}' missing in request")]
	MissingAttribute(&'static str),
	#[error(transparent)]
	InvalidAddress(#[from] InvalidAddress),
}

/// What the store remembers about a triplet: when it was last seen and
/// whether it has ever been admitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
	pub last_seen: i64,
	pub passed: bool,
}

impl Record {
	pub fn encode(&self) -> String {
		format!("{}{}{}", self.last_seen, FIELD_SEPARATOR, self.passed)
	}

	pub fn decode(value: &str) -> Result<Self, MalformedRecord> {
		let (last_seen, passed) = value
			.split_once(FIELD_SEPARATOR)
			.ok_or_else(|| MalformedRecord(value.to_owned()))?;

		Ok(Self {
			last_seen: last_seen
				.parse()
				.map_err(|_| MalformedRecord(value.to_owned()))?,
			passed: passed
				.parse()
				.map_err(|_| MalformedRecord(value.to_owned()))?,
		})
	}

	/// Seconds since this record was written. Negative if the clock has
	/// gone backwards since then.
	pub fn age(&self, now: i64) -> i64 {
		now - self.last_seen
	}
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("stored record '{0}' is not a last-seen/passed pair")]
pub struct MalformedRecord(pub String);
