use std::io::IsTerminal;

use log::LevelFilter;
use syslog::Facility;

/// The identity log lines carry when syslog is the destination.
const SYSLOG_IDENTITY: &str = "tgreylist";

/// True when stderr is connected to a terminal. Used to pick the default
/// log destination, also before the command line has been parsed.
pub fn stderr_is_terminal() -> bool {
	std::io::stderr().is_terminal()
}

/// Route the log facade either to stderr or to syslog under LOG_DAEMON,
/// minimum level info. When syslog cannot be reached the daemon falls back
/// to stderr rather than running silent.
pub fn init(to_stderr: bool) {
	if !to_stderr
		&& syslog::init(Facility::LOG_DAEMON, LevelFilter::Info, Some(SYSLOG_IDENTITY)).is_ok()
	{
		return;
	}

	env_logger::Builder::new()
		.filter_level(LevelFilter::Info)
		.init();
}
