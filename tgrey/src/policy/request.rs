use std::collections::HashMap;

/// The attributes the decision engine cares about. Postfix sends a few
/// dozen more per request; they are dropped on the floor.
const KEPT_ATTRIBUTES: [&str; 5] = [
	"request",
	"sender",
	"recipient",
	"client_name",
	"client_address",
];

/// One request block of the policy delegation protocol: the key=value
/// lines the MTA sent before the empty terminator line.
#[derive(Clone, Debug, Default)]
pub struct Request {
	attrs: HashMap<String, String>,
}

impl Request {
	/// Build a request from the lines of one block. Lines without an equals
	/// sign are skipped, as are lines whose value is nothing but whitespace.
	/// An empty value is kept, though: Postfix sends "sender=" for bounce
	/// mail and that empty sender is part of the triplet. Keys match
	/// case-insensitively.
	pub fn from_lines<'a, I>(lines: I) -> Self
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut attrs = HashMap::new();

		for line in lines {
			let (key, value) = match line.split_once('=') {
				Some(pair) => pair,
				None => continue,
			};

			if !value.is_empty() && value.chars().all(char::is_whitespace) {
				continue;
			}

			let key = key.to_lowercase();
			if KEPT_ATTRIBUTES.contains(&key.as_str()) {
				attrs.insert(key, value.to_owned());
			}
		}

		Self { attrs }
	}

	/// The protocol type of this block, normally "smtpd_access_policy".
	/// None if the peer never said, in which case it likely would not
	/// understand a reply either.
	pub fn request(&self) -> Option<&str> {
		self.attrs.get("request").map(String::as_str)
	}

	/// The envelope sender. May be the empty string for bounce mail.
	pub fn sender(&self) -> Option<&str> {
		self.attrs.get("sender").map(String::as_str)
	}

	pub fn recipient(&self) -> Option<&str> {
		self.attrs.get("recipient").map(String::as_str)
	}

	/// The client hostname, absent when Postfix sent none or sent the
	/// literal "unknown" because reverse DNS failed.
	pub fn client_name(&self) -> Option<&str> {
		self.known("client_name")
	}

	/// The client address, absent when missing or "unknown".
	pub fn client_address(&self) -> Option<&str> {
		self.known("client_address")
	}

	fn known(&self, name: &str) -> Option<&str> {
		match self.attrs.get(name) {
			Some(value) if !value.is_empty() && !value.eq_ignore_ascii_case("unknown") => {
				Some(value.as_str())
			}
			_ => None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn keeps_the_interesting_attributes() {
		let req = Request::from_lines([
			"request=smtpd_access_policy",
			"sender=a@x.com",
			"recipient=b@y.com",
			"client_name=mail.example.com",
			"client_address=203.0.113.5",
		]);

		assert_eq!(req.request(), Some("smtpd_access_policy"));
		assert_eq!(req.sender(), Some("a@x.com"));
		assert_eq!(req.recipient(), Some("b@y.com"));
		assert_eq!(req.client_name(), Some("mail.example.com"));
		assert_eq!(req.client_address(), Some("203.0.113.5"));
	}

	#[test]
	fn drops_everything_else() {
		let req = Request::from_lines([
			"request=smtpd_access_policy",
			"protocol_state=RCPT",
			"helo_name=mail.example.com",
			"queue_id=8045F2AB23",
		]);

		assert_eq!(req.request(), Some("smtpd_access_policy"));
		assert_eq!(req.sender(), None);
	}

	#[test]
	fn skips_lines_without_equals() {
		let req = Request::from_lines(["noise", "sender=a@x.com"]);
		assert_eq!(req.sender(), Some("a@x.com"));
		assert_eq!(req.recipient(), None);
	}

	#[test]
	fn skips_whitespace_values_but_keeps_empty_ones() {
		let req = Request::from_lines(["sender=", "recipient=   "]);
		assert_eq!(req.sender(), Some(""));
		assert_eq!(req.recipient(), None);
	}

	#[test]
	fn keys_are_case_insensitive() {
		let req = Request::from_lines(["SENDER=a@x.com", "Recipient=b@y.com"]);
		assert_eq!(req.sender(), Some("a@x.com"));
		assert_eq!(req.recipient(), Some("b@y.com"));
	}

	#[test]
	fn unknown_clients_count_as_absent() {
		let req = Request::from_lines(["client_name=unknown", "client_address=UNKNOWN"]);
		assert_eq!(req.client_name(), None);
		assert_eq!(req.client_address(), None);
	}

	#[test]
	fn values_keep_their_case() {
		let req = Request::from_lines(["sender=A@X.COM"]);
		assert_eq!(req.sender(), Some("A@X.COM"));
	}
}
