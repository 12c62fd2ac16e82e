use log::{info, warn};

use crate::{
	policy::Response,
	store::{Store, StoreError},
	triplet::{Record, Triplet},
};

/// The three time thresholds the state machine runs on, in seconds. All of
/// them are signed so that ages from a backwards-running clock compare
/// sanely.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
	/// How long a new triplet is deferred before a retry may pass.
	pub delay: i64,
	/// A triplet that never passed and is older than this is reset.
	pub timeout: i64,
	/// Any triplet older than this is reset.
	pub lifetime: i64,
}

impl Limits {
	fn expired(&self, record: &Record, now: i64) -> bool {
		let age = record.age(now);
		age > self.lifetime || (age > self.timeout && !record.passed)
	}
}

/// What the state machine decided for one delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
	/// No live record for this triplet; start the clock and defer.
	New,
	/// The triplet may pass; refresh last_seen and wave it through.
	Pass,
	/// Still inside the delay window; defer without touching last_seen.
	Wait,
}

/// The greylisting state machine. An expired record is treated exactly as
/// if it never existed. A record from the future (the clock went backwards
/// since it was written) has a negative age and therefore never crosses
/// the delay threshold; it stays grey until the clock catches up.
pub fn judge(record: Option<Record>, now: i64, limits: &Limits) -> Verdict {
	let record = match record {
		Some(record) if !limits.expired(&record, now) => record,
		_ => return Verdict::New,
	};

	if record.passed || record.age(now) > limits.delay {
		Verdict::Pass
	} else {
		Verdict::Wait
	}
}

/// Look the triplet up, judge it, and apply the verdict to the store. Every
/// decision leaves one info line in the log.
pub fn handle(
	store: &mut Store,
	triplet: &Triplet,
	now: i64,
	limits: &Limits,
) -> Result<Response, StoreError> {
	let key = triplet.key();

	let record = match store.get(&key)? {
		Some(value) => match Record::decode(&value) {
			Ok(record) => Some(record),
			Err(err) => {
				// treated as absent; the write below replaces it
				warn!("{}", err);
				None
			}
		},
		None => None,
	};

	match judge(record, now, limits) {
		Verdict::New => {
			store.put(
				&key,
				&Record {
					last_seen: now,
					passed: false,
				}
				.encode(),
			)?;
			info!("new: {}", triplet);
			Ok(Response::service_unavailable())
		}
		Verdict::Pass => {
			store.put(
				&key,
				&Record {
					last_seen: now,
					passed: true,
				}
				.encode(),
			)?;
			info!("ok: {}", triplet);
			Ok(Response::dunno())
		}
		Verdict::Wait => {
			info!("wait: {}", triplet);
			Ok(Response::service_unavailable())
		}
	}
}
