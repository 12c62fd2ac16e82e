mod config;

use std::time::{SystemTime, UNIX_EPOCH};

use log::error;
use thiserror::Error;

use tgrey::{
	engine,
	logging,
	policy::{Request, Response},
	store::{Store, StoreError},
	triplet::{Triplet, TripletError},
};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() {
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

	let mut store = Store::new(&config.database);
	let stdin = BufReader::new(tokio::io::stdin());
	let stdout = tokio::io::stdout();

	tokio::select! {
		_ = run(stdin, stdout, &mut store, &config) => {}
		_ = shutdown_signal() => {}
	}

	if let Err(err) = store.close() {
		error!("{}", err);
	}
}

/// Read request blocks until end-of-file, answering each one. Any failure
/// while handling a request is answered with dunno: a broken greylister
/// must never block mail.
async fn run<R, W>(mut input: R, mut output: W, store: &mut Store, config: &Config)
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	while let Some(lines) = read_block(&mut input).await {
		let request = Request::from_lines(lines.iter().map(String::as_str));

		// without even a request attribute the peer is speaking some other
		// protocol and would likely not understand a reply; stay quiet
		if request.request().is_none() {
			continue;
		}

		let response = match handle(&request, store, config) {
			Ok(response) => response,
			Err(err) => {
				error!("{}", err);
				Response::dunno()
			}
		};

		if output
			.write_all(response.as_string().as_bytes())
			.await
			.is_err()
		{
			break;
		}
		if output.flush().await.is_err() {
			break;
		}
	}
}

fn handle(request: &Request, store: &mut Store, config: &Config) -> Result<Response, HandleError> {
	if request.request() != Some("smtpd_access_policy") {
		return Err(HandleError::WrongProtocol);
	}

	let triplet = Triplet::from_request(request, config.v4mask, config.v6mask)?;

	// opening is lazy and idempotent; when it fails here the store stays
	// closed and the next request tries again
	store.open()?;

	Ok(engine::handle(store, &triplet, unix_now()?, &config.limits)?)
}

/// Read one key=value block, up to its empty-line terminator. A block cut
/// short by end-of-file is still returned; None once the stream is done.
/// A line that is not valid UTF-8 is dropped without giving up on the
/// stream.
async fn read_block<R: AsyncBufRead + Unpin>(input: &mut R) -> Option<Vec<String>> {
	let mut lines = Vec::new();

	loop {
		let mut line = String::new();
		match input.read_line(&mut line).await {
			Err(err) if err.kind() == std::io::ErrorKind::InvalidData => continue,
			Ok(0) | Err(_) => {
				return if lines.is_empty() { None } else { Some(lines) };
			}
			Ok(_) => {
				let line = line.trim_end_matches('\n');
				if line.is_empty() {
					return Some(lines);
				}
				lines.push(line.to_owned());
			}
		}
	}
}

fn unix_now() -> Result<i64, HandleError> {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|dur| dur.as_secs() as i64)
		.map_err(|_| HandleError::Clock)
}

async fn shutdown_signal() {
	use tokio::signal::unix::{signal, SignalKind};

	let mut terminate = signal(SignalKind::terminate()).unwrap();
	let mut interrupt = signal(SignalKind::interrupt()).unwrap();

	tokio::select! {
		_ = tokio::signal::ctrl_c() => (),
		_ = terminate.recv() => (),
		_ = interrupt.recv() => ()
	};
}

#[derive(Debug, Error)]
enum HandleError {
	#[error("request attribute is not smtpd_access_policy")]
	WrongProtocol,
	#[error(transparent)]
	Triplet(#[from] TripletError),
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error("the system clock is set before the unix epoch")]
	Clock,
}
