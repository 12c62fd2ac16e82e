mod config;

use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info, warn};

use tgrey::{
	logging,
	store::{Store, StoreError},
	triplet::Record,
};

use config::Config;

fn main() {
	let config = match Config::get() {
		Some(config) => config,
		None => {
			// the log-to-stderr flag may not even have been parsed at this
			// point, so fall back to the terminal heuristic
			logging::init(logging::stderr_is_terminal());
			error!("Error parsing commandline.");
			std::process::exit(1);
		}
	};

	logging::init(config.log_to_stderr);

	let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
		Ok(dur) => dur.as_secs() as i64,
		Err(_) => {
			error!("the system clock is set before the unix epoch");
			std::process::exit(1);
		}
	};

	let mut store = Store::new(&config.database);
	let removed = match sweep(&mut store, now, config.lifetime) {
		Ok(removed) => removed,
		Err(err) => {
			error!("{}", err);
			std::process::exit(1);
		}
	};

	info!("Cleanup removed {} database entries.", removed);

	if let Err(err) = store.close() {
		error!("{}", err);
	}
}

/// Delete every entry last seen more than lifetime seconds ago. Entries
/// that no longer decode are swept too; an unreadable record cannot be
/// told apart from an ancient one.
fn sweep(store: &mut Store, now: i64, lifetime: i64) -> Result<u64, StoreError> {
	store.open()?;

	let mut removed = 0;
	store.traverse(|store, key, value| {
		let expired = match Record::decode(value) {
			Ok(record) => record.age(now) > lifetime,
			Err(err) => {
				warn!("{}", err);
				true
			}
		};

		if expired {
			store.remove(key)?;
			removed += 1;
		}

		Ok(())
	})?;

	Ok(removed)
}
