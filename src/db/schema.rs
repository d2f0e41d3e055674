use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS fetches (
            address      TEXT PRIMARY KEY,
            record_count INTEGER NOT NULL,
            fetched_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tx_cache (
            address    TEXT NOT NULL,
            position   INTEGER NOT NULL,
            hash       TEXT,
            from_addr  TEXT,
            to_addr    TEXT,
            value      TEXT,
            time_stamp TEXT,
            PRIMARY KEY (address, position)
        );
        ",
    )?;
    Ok(())
}
