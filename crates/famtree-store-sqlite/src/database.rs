//! [`Database`], owner of the single connection slot, and the [`Session`]
//! guard that holds a connection inside one transaction.

use std::{
  path::{Path, PathBuf},
  sync::atomic::{AtomicBool, AtomicU64, Ordering},
  time::Duration,
};

use famtree_core::{
  event::Event,
  person::Person,
  user::{AuthToken, User},
};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::{Error, Result, dao::Dao, schema::SCHEMA, table::Record};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static MEMORY_DATABASES: AtomicU64 = AtomicU64::new(0);

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a unit of work asks [`Database::run_transaction`] to do with its
/// writes. Both variants carry the value returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
  Commit(T),
  Rollback(T),
}

impl<T> Outcome<T> {
  pub fn commits(&self) -> bool { matches!(self, Self::Commit(_)) }

  pub fn into_inner(self) -> T {
    match self {
      Self::Commit(value) | Self::Rollback(value) => value,
    }
  }
}

// ─── Database ────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Location {
  File(PathBuf),
  /// Shared-cache URI of a named in-memory database.
  Memory(String),
}

/// A famtree store backed by a single SQLite database.
///
/// At most one [`Session`] may be open at a time; a second
/// [`open_connection`](Self::open_connection) fails with
/// [`Error::AlreadyOpen`] until the first is closed or dropped.
pub struct Database {
  location: Location,
  busy:     AtomicBool,
  /// Keeps a named in-memory database alive between sessions.
  _anchor:  Option<Connection>,
}

impl Database {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = Connection::open(&path).map_err(Error::connection("open"))?;
    conn
      .execute_batch("PRAGMA journal_mode = WAL;")
      .map_err(Error::connection("configure"))?;
    conn
      .execute_batch(SCHEMA)
      .map_err(Error::connection("create schema"))?;
    debug!(path = %path.display(), "opened store");

    Ok(Self {
      location: Location::File(path),
      busy:     AtomicBool::new(false),
      _anchor:  None,
    })
  }

  /// Open a private in-memory store, mostly for tests.
  pub fn open_in_memory() -> Result<Self> {
    let n = MEMORY_DATABASES.fetch_add(1, Ordering::Relaxed);
    let uri = format!(
      "file:famtree-{}-{n}?mode=memory&cache=shared",
      std::process::id()
    );
    let anchor = Connection::open(&uri).map_err(Error::connection("open"))?;
    anchor
      .execute_batch(SCHEMA)
      .map_err(Error::connection("create schema"))?;

    Ok(Self {
      location: Location::Memory(uri),
      busy:     AtomicBool::new(false),
      _anchor:  Some(anchor),
    })
  }

  /// Open the connection and begin a transaction.
  ///
  /// The returned [`Session`] rolls back when dropped unless
  /// [`Session::close`] was called with `commit = true` first.
  pub fn open_connection(&self) -> Result<Session<'_>> {
    if self
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(Error::AlreadyOpen);
    }

    match self.connect() {
      Ok(conn) => Ok(Session { conn, db: self, open: true }),
      Err(e) => {
        self.release();
        Err(e)
      }
    }
  }

  /// Run `work` inside one transaction.
  ///
  /// `Outcome::Commit` commits and `Outcome::Rollback` discards; an `Err` from
  /// `work` rolls back before it is returned. The connection is released on
  /// every path.
  pub fn run_transaction<T, E, F>(&self, work: F) -> Result<T, E>
  where
    F: FnOnce(&Session<'_>) -> Result<Outcome<T>, E>,
    E: From<Error>,
  {
    let session = self.open_connection()?;
    let outcome = work(&session)?;
    let commit = outcome.commits();
    session.close(commit)?;
    Ok(outcome.into_inner())
  }

  /// Delete every row from every table in one transaction.
  pub fn clear_tables(&self) -> Result<()> {
    self.run_transaction(|session| {
      session.events().delete_all()?;
      session.persons().delete_all()?;
      session.auth_tokens().delete_all()?;
      session.users().delete_all()?;
      Ok::<_, Error>(Outcome::Commit(()))
    })
  }

  /// `true` while a session is open.
  pub fn is_busy(&self) -> bool { self.busy.load(Ordering::Acquire) }

  fn connect(&self) -> Result<Connection> {
    let conn = match &self.location {
      Location::File(path) => Connection::open(path),
      Location::Memory(uri) => Connection::open(uri),
    }
    .map_err(Error::connection("open"))?;

    conn
      .busy_timeout(BUSY_TIMEOUT)
      .map_err(Error::connection("configure"))?;
    conn
      .execute_batch("PRAGMA foreign_keys = ON; BEGIN IMMEDIATE;")
      .map_err(Error::connection("begin"))?;
    Ok(conn)
  }

  fn release(&self) { self.busy.store(false, Ordering::Release); }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// A connection holding an open transaction.
///
/// Every record access goes through a [`Dao`] borrowed from a session.
pub struct Session<'db> {
  conn: Connection,
  db:   &'db Database,
  open: bool,
}

impl Session<'_> {
  /// End the transaction, committing when `commit` is set and rolling back
  /// otherwise, and release the connection.
  ///
  /// A commit that fails (e.g. a deferred foreign-key check) is rolled back
  /// before the error is returned.
  pub fn close(mut self, commit: bool) -> Result<()> { self.finish(commit) }

  /// Record access for `R`'s table.
  pub fn dao<R: Record>(&self) -> Dao<'_, R> { Dao::new(&self.conn) }

  pub fn users(&self) -> Dao<'_, User> { self.dao() }

  pub fn persons(&self) -> Dao<'_, Person> { self.dao() }

  pub fn events(&self) -> Dao<'_, Event> { self.dao() }

  pub fn auth_tokens(&self) -> Dao<'_, AuthToken> { self.dao() }

  fn finish(&mut self, commit: bool) -> Result<()> {
    if !self.open {
      return Ok(());
    }
    self.open = false;

    if commit {
      if let Err(source) = self.conn.execute_batch("COMMIT") {
        self.rollback_quietly();
        return Err(Error::Connection { op: "commit", source });
      }
      debug!("transaction committed");
    } else {
      self
        .conn
        .execute_batch("ROLLBACK")
        .map_err(Error::connection("rollback"))?;
      debug!("transaction rolled back");
    }
    Ok(())
  }

  fn rollback_quietly(&mut self) {
    if self.conn.is_autocommit() {
      return;
    }
    if let Err(e) = self.conn.execute_batch("ROLLBACK") {
      warn!(error = %e, "rollback failed while releasing connection");
    }
  }
}

impl Drop for Session<'_> {
  fn drop(&mut self) {
    if self.open {
      self.open = false;
      debug!("rolling back abandoned transaction");
      self.rollback_quietly();
    }
    self.db.release();
  }
}
