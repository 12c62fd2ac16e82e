use std::path::PathBuf;

use confindent::Confindent;
use getopts::Options;

use tgrey::{engine::Limits, logging, timespan::parse_timespan};

pub struct Config {
	pub database: PathBuf,
	pub limits: Limits,
	pub v4mask: u32,
	pub v6mask: u32,
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
				 process runs under needs read and write access and, if the file \
				 does not exist yet, permission to create it.\nDefault: {}",
				tgrey::DEFAULT_DATABASE
			),
			"PATH",
		);
		opts.optopt(
			"d",
			"delay",
			"How long after a triplet is first seen the first retry for it is \
			 allowed through.\nDefault: 5m",
			"TIMESPAN",
		);
		opts.optopt(
			"t",
			"timeout",
			"Triplets older than this which have never been cleared for delivery \
			 are rejected and reset.\nDefault: 7d",
			"TIMESPAN",
		);
		opts.optopt(
			"l",
			"lifetime",
			"Triplets for which no matching mail has been seen for this long are \
			 rejected and reset in any case.\nDefault: 90d",
			"TIMESPAN",
		);
		opts.optopt(
			"4",
			"v4mask",
			"Prefix size kept when masking IPv4 client addresses, grouping \
			 delivery agents of one subnet together.\nDefault: 32",
			"BITS",
		);
		opts.optopt(
			"6",
			"v6mask",
			"Same as --v4mask but for IPv6 addresses.\nDefault: 128",
			"BITS",
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

		let limits = Limits {
			delay: parse_timespan(&find_value("delay").unwrap_or("5m".into())) as i64,
			timeout: parse_timespan(&find_value("timeout").unwrap_or("7d".into())) as i64,
			lifetime: parse_timespan(&find_value("lifetime").unwrap_or("90d".into())) as i64,
		};

		let v4mask_string = find_value("v4mask").unwrap_or("32".into());
		let v4mask = match v4mask_string.parse() {
			Ok(bits) => bits,
			Err(_e) => {
				eprintln!("Failed to parse '{}' as a prefix length", v4mask_string);
				return None;
			}
		};

		let v6mask_string = find_value("v6mask").unwrap_or("128".into());
		let v6mask = match v6mask_string.parse() {
			Ok(bits) => bits,
			Err(_e) => {
				eprintln!("Failed to parse '{}' as a prefix length", v6mask_string);
				return None;
			}
		};

		let log_to_stderr =
			matches.opt_present("log-to-stderr") || logging::stderr_is_terminal();

		Some(Self {
			database,
			limits,
			v4mask,
			v6mask,
			log_to_stderr,
		})
	}
}
