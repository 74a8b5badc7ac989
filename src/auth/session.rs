use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::state::DbPool;

fn checkout(pool: &DbPool) -> Result<PooledConnection<SqliteConnectionManager>, rusqlite::Error> {
    pool.get().map_err(|e| {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(e.to_string()),
        )
    })
}

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: i64, hours: u64) -> Result<String, rusqlite::Error> {
    let conn = checkout(pool)?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Read a boolean flag stored on the session. Unset flags read as `false`.
pub fn get_flag(pool: &DbPool, token: &str, name: &str) -> Result<bool, rusqlite::Error> {
    let conn = checkout(pool)?;

    let value: Option<bool> = conn
        .query_row(
            "SELECT value FROM session_flags WHERE token = ?1 AND name = ?2",
            params![token, name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value.unwrap_or(false))
}

/// Store a boolean flag on the session, replacing any previous value.
pub fn set_flag(pool: &DbPool, token: &str, name: &str, value: bool) -> Result<(), rusqlite::Error> {
    let conn = checkout(pool)?;

    conn.execute(
        "INSERT INTO session_flags (token, name, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(token, name) DO UPDATE SET value = excluded.value",
        params![token, name, value],
    )?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn pool_with_user() -> (DbPool, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        pool.get()
            .unwrap()
            .execute(
                "INSERT INTO users (id, name, email, password_hash) VALUES (1, 'alice', 'a@x', 'h')",
                [],
            )
            .unwrap();
        (pool, tmp)
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn create_session_stores_unexpired_row() {
        let (pool, _tmp) = pool_with_user();
        let token = create_session(&pool, 1, 1).unwrap();

        let live: bool = pool
            .get()
            .unwrap()
            .query_row(
                "SELECT expires_at > datetime('now') FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .unwrap();
        assert!(live);
    }

    #[test]
    fn flags_default_to_false_and_round_trip() {
        let (pool, _tmp) = pool_with_user();
        let token = create_session(&pool, 1, 1).unwrap();

        assert!(!get_flag(&pool, &token, "views").unwrap());
        set_flag(&pool, &token, "views", true).unwrap();
        assert!(get_flag(&pool, &token, "views").unwrap());
        set_flag(&pool, &token, "views", false).unwrap();
        assert!(!get_flag(&pool, &token, "views").unwrap());
    }

    #[test]
    fn flags_are_scoped_to_their_session() {
        let (pool, _tmp) = pool_with_user();
        let first = create_session(&pool, 1, 1).unwrap();
        let second = create_session(&pool, 1, 1).unwrap();

        set_flag(&pool, &first, "views", true).unwrap();
        assert!(!get_flag(&pool, &second, "views").unwrap());
    }
}
