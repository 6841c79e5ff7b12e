use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::{debug, warn};

/// One result row, columns in statement order
pub type Row = Vec<Value>;

/// One open connection plus its single active transaction, scoped to one
/// logical unit of work.
///
/// The transaction spans the whole session: it begins in [`Session::open`]
/// and ends in [`Session::close`] (commit on the success path, rollback on
/// the failure path). A session that is dropped without being closed rolls
/// back, so the connection is never left open past scope exit.
#[derive(Debug)]
pub struct Session {
    // Some until close() or drop() takes it, exactly once.
    conn: Option<Connection>,
    failed: bool,
}

impl Session {
    /// Open a connection, begin the transaction, and apply the foreign-key
    /// pragma when configured.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let conn = Connection::open_with_flags(&config.database, config.flags)
            .map_err(SessionError::Connection)?;

        if let Err(e) = begin(&conn, config.foreign_keys) {
            // The transaction never started; close before surfacing.
            if let Err((_, close_err)) = conn.close() {
                warn!(error = %close_err, "failed to close connection after failed begin");
            }
            return Err(SessionError::Connection(e));
        }

        debug!(
            database = %config.database.display(),
            foreign_keys = config.foreign_keys,
            "session opened"
        );

        Ok(Session {
            conn: Some(conn),
            failed: false,
        })
    }

    /// Execute one raw statement against the active transaction and return
    /// every resulting row. Statements that produce no result set return an
    /// empty vector.
    ///
    /// The statement text is passed through unmodified and unparameterized;
    /// callers are responsible for escaping.
    pub fn run(&mut self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.conn.as_ref().expect("connection present until close");
        match fetch_all(conn, sql) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                self.failed = true;
                Err(SessionError::Query(e))
            }
        }
    }

    /// Commit (or roll back, if any statement failed) and close the
    /// connection. Invoked at most once; sessions dropped without an
    /// explicit close roll back instead.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        let result = if self.failed {
            // Failure path: teardown faults are handled here, not re-raised.
            match conn.execute_batch("ROLLBACK") {
                Ok(()) => {
                    debug!("transaction rolled back");
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "rollback failed");
                    Ok(())
                }
            }
        } else {
            match conn.execute_batch("COMMIT") {
                Ok(()) => {
                    debug!("transaction committed");
                    Ok(())
                }
                Err(e) => {
                    if let Err(rb) = conn.execute_batch("ROLLBACK") {
                        warn!(error = %rb, "rollback after failed commit also failed");
                    }
                    Err(SessionError::Query(e))
                }
            }
        };

        // Close unconditionally as the final step, even when commit or
        // rollback itself raised.
        if let Err((_, e)) = conn.close() {
            warn!(error = %e, "failed to close connection");
        }

        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.conn.is_some() {
            self.failed = true;
            let _ = self.release();
        }
    }
}

/// Run exactly one statement under scoped acquisition and release: open,
/// run, then commit on success or roll back on failure, closing the
/// connection on every path.
pub fn execute_query(config: &SessionConfig, sql: &str) -> Result<Vec<Row>> {
    let mut session = Session::open(config)?;
    let rows = session.run(sql)?;
    session.close()?;
    Ok(rows)
}

fn begin(conn: &Connection, foreign_keys: bool) -> rusqlite::Result<()> {
    // PRAGMA foreign_keys is a no-op once a transaction is pending, so it
    // has to be applied before BEGIN.
    if foreign_keys {
        conn.pragma_update(None, "foreign_keys", "ON")?;
    }
    conn.execute_batch("BEGIN")
}

fn fetch_all(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let column_count = stmt.column_count();

    let rows = stmt.query_map([], |row| {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(row.get::<_, Value>(i)?);
        }
        Ok(values)
    })?;

    rows.collect()
}
