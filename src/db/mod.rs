pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the database at `path`, applies connection settings and runs pending
/// migrations. `":memory:"` gives a private database for tests.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("failed to open database {path}"))?;

    configure(&conn, path != ":memory:")?;
    migrations::run_migrations(&conn)?;

    Ok(conn)
}

fn configure(conn: &Connection, on_disk: bool) -> anyhow::Result<()> {
    // sweeps write while admin requests read; in-memory databases have no WAL
    if on_disk {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("failed to enable WAL")?;
        if !mode.eq_ignore_ascii_case("wal") {
            tracing::warn!(journal_mode = %mode, "database is not in WAL mode");
        }
    }

    conn.pragma_update(None, "foreign_keys", true)
        .context("failed to enable foreign keys")?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;
    Ok(())
}
