use std::{
	fs::OpenOptions,
	os::unix::fs::OpenOptionsExt,
	path::PathBuf,
};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// The embedded keystore greylist entries live in. One table mapping the
/// triplet key to its encoded record, nothing else; traversal order is
/// whatever sqlite feels like.
pub struct Store {
	path: PathBuf,
	conn: Option<Connection>,
}

impl Store {
	/// Remembers the path. Nothing touches the filesystem until open.
	pub fn new<P: Into<PathBuf>>(path: P) -> Self {
		Self {
			path: path.into(),
			conn: None,
		}
	}

	/// Open the database, creating it if it does not exist yet. Calling
	/// this on an already-open store is a no-op.
	pub fn open(&mut self) -> Result<(), StoreError> {
		if self.conn.is_some() {
			return Ok(());
		}

		// sqlite would create the file itself, but with the process umask;
		// triplets name sender/recipient pairs, so create it owner-only
		if !self.path.exists() {
			OpenOptions::new()
				.write(true)
				.create(true)
				.mode(0o600)
				.open(&self.path)
				.map_err(|err| StoreError::Open(self.path.clone(), err.to_string()))?;
		}

		let conn = Connection::open(&self.path)
			.map_err(|err| StoreError::Open(self.path.clone(), err.to_string()))?;
		conn.execute(
			"CREATE TABLE IF NOT EXISTS greylist (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
			[],
		)
		.map_err(|err| StoreError::Open(self.path.clone(), err.to_string()))?;

		self.conn = Some(conn);
		Ok(())
	}

	/// A missing key is not an error, just None.
	pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		let value = self
			.conn()?
			.query_row(
				"SELECT value FROM greylist WHERE key = ?1",
				params![key],
				|row| row.get(0),
			)
			.optional()?;

		Ok(value)
	}

	/// Insert or overwrite; the store never distinguishes the two.
	pub fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
		self.conn()?.execute(
			"INSERT OR REPLACE INTO greylist (key, value) VALUES (?1, ?2)",
			params![key, value],
		)?;

		Ok(())
	}

	/// Removing a key that is not there is fine.
	pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
		self.conn()?
			.execute("DELETE FROM greylist WHERE key = ?1", params![key])?;

		Ok(())
	}

	/// Visit every entry once. The callback gets the store handed back so
	/// it can delete or rewrite what it is looking at; returning an error
	/// stops the walk and propagates.
	pub fn traverse<F>(&mut self, mut visit: F) -> Result<(), StoreError>
	where
		F: FnMut(&mut Store, &str, &str) -> Result<(), StoreError>,
	{
		// snapshot the entries first so the callback is free to mutate
		let entries: Vec<(String, String)> = {
			let conn = self.conn()?;
			let mut stmt = conn.prepare("SELECT key, value FROM greylist")?;
			let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
			rows.collect::<rusqlite::Result<_>>()?
		};

		for (key, value) in entries {
			visit(self, &key, &value)?;
		}

		Ok(())
	}

	/// Flush and close. Dropping the store closes it as well; this way the
	/// error surfaces instead.
	pub fn close(&mut self) -> Result<(), StoreError> {
		if let Some(conn) = self.conn.take() {
			conn.close().map_err(|(_, err)| StoreError::Sqlite(err))?;
		}

		Ok(())
	}

	fn conn(&self) -> Result<&Connection, StoreError> {
		self.conn.as_ref().ok_or(StoreError::NotOpen)
	}
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("could not open database {}: {}", .0.display(), .1)]
	Open(PathBuf, String),
	#[error("the database has not been opened")]
	NotOpen,
	#[error("database operation failed: {0}")]
	Sqlite(#[from] rusqlite::Error),
}
