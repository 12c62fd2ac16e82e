/// The policy delegation verbs this daemon ever answers with. dunno means
/// no opinion, defer_if_permit is a temporary rejection that an earlier
/// permit decision overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
	Dunno,
	DeferIfPermit,
}

impl Action {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dunno => "dunno",
			Self::DeferIfPermit => "defer_if_permit",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Response {
	action: Action,
	text: Option<String>,
}

impl Response {
	/// No opinion; the next check in the MTA decides.
	pub fn dunno() -> Self {
		Self {
			action: Action::Dunno,
			text: None,
		}
	}

	/// Temporary rejection with the canonical greylisting text.
	pub fn service_unavailable() -> Self {
		Self {
			action: Action::DeferIfPermit,
			text: Some(String::from("Service is unavailable")),
		}
	}

	pub fn action(&self) -> Action {
		self.action
	}

	/// The wire form, empty-line terminator included.
	pub fn as_string(&self) -> String {
		let mut ret = format!("action={}", self.action.as_str());

		if let Some(text) = &self.text {
			ret.push(' ');
			ret.push_str(text);
		}

		ret.push_str("\n\n");
		ret
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn dunno_as_string() {
		assert_eq!(Response::dunno().as_string(), "action=dunno\n\n");
	}

	#[test]
	fn service_unavailable_as_string() {
		assert_eq!(
			Response::service_unavailable().as_string(),
			"action=defer_if_permit Service is unavailable\n\n"
		);
	}
}
