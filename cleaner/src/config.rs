use std::path::PathBuf;

use confindent::Confindent;
use getopts::Options;

use tgrey::{logging, timespan::parse_timespan};

pub struct Config {
	pub database: PathBuf,
	pub lifetime: i64,
	pub log_to_stderr: bool,
}

#[allow(clippy::or_fun_call)]
impl Config {
	fn print_usage<S: AsRef<str>>(prgm: S, opts: &Options) {
		let brief = format!("Usage: {} [options]", prgm.as_ref());
		println!("{}", opts.usage(&brief));
	}

	pub fn get() -> Option<Self> {
		let args: Vec<String> = std::env::args().collect();

		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optopt(
			"D",
			"database",
			&format!(
				"Path to the database storing greylisting triplets. The user this \
				 process runs under needs read and write access.\nDefault: {}",
				tgrey::DEFAULT_DATABASE
			),
			"PATH",
		);
		opts.optopt(
			"l",
			"lifetime",
			"Triplets for which no matching mail has been seen for this long are \
			 removed from the database.\nDefault: 90d",
			"TIMESPAN",
		);
		opts.optflag(
			"e",
			"log-to-stderr",
			"Force log output to standard error even when it is not connected \
			 to a terminal.",
		);
		opts.optopt(
			"c",
			"config",
			"An alternate location to read the config from\nDefault: /etc/tgrey.conf",
			"PATH",
		);

		let matches = match opts.parse(&args[1..]) {
			Ok(m) => m,
			Err(err) => {
				eprintln!("{}", err);
				return None;
			}
		};

		if matches.opt_present("help") {
			Self::print_usage(&args[0], &opts);
			std::process::exit(0);
		}

		let conf_path = matches.opt_str("config").unwrap_or("/etc/tgrey.conf".into());
		// the config file is optional; flags and defaults cover everything
		let config = Confindent::from_file(conf_path).ok();

		// Options specified on the command line take priority. We only take the
		// cli_key and convert to the config key internally so that we can remain
		// consistent.
		let find_value = |cli_key: &str| -> Option<String> {
			let conf_key: String = cli_key
				.split('-')
				.map(|word| {
					let mut c = word.chars();
					match c.next() {
						None => String::new(),
						Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
					}
				})
				.collect();

			matches.opt_str(cli_key).or(config
				.as_ref()
				.and_then(|conf| conf.child_value(conf_key))
				.map(|s| s.into()))
		};

		let database = PathBuf::from(
			find_value("database").unwrap_or(tgrey::DEFAULT_DATABASE.into()),
		);

		let lifetime = parse_timespan(&find_value("lifetime").unwrap_or("90d".into())) as i64;

		let log_to_stderr =
			matches.opt_present("log-to-stderr") || logging::stderr_is_terminal();

		Some(Self {
			database,
			lifetime,
			log_to_stderr,
		})
	}
}
