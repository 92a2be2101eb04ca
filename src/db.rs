use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

// ── Storage keys ──

pub const JIRA_CONTENT: &str = "jiraContent";
pub const JIRA_CONTENT_HTML: &str = "jiraContentHtml";
pub const AI_RESULT: &str = "aiResult";
pub const CUSTOM_PROMPT_TEMPLATE: &str = "customPromptTemplate";

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open database {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS storage (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS runs (
            id         INTEGER PRIMARY KEY,
            identifier TEXT NOT NULL,
            link       TEXT NOT NULL,
            text       TEXT NOT NULL,
            html       TEXT NOT NULL,
            result     TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_runs_identifier ON runs(identifier);
        ",
    )?;
    Ok(())
}

// ── Key-value storage ──

pub fn save(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        rusqlite::params![key, value],
    )?;
    tracing::debug!("Content saved to storage with key: {}", key);
    Ok(())
}

pub fn read(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM storage WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM storage WHERE key = ?1", rusqlite::params![key])?;
    Ok(n > 0)
}

// ── Run archive ──

pub struct RunRow {
    pub identifier: String,
    pub link: String,
    pub text: String,
    pub html: String,
    pub result: String,
}

pub fn insert_run(conn: &Connection, row: &RunRow) -> Result<i64> {
    conn.execute(
        "INSERT INTO runs (identifier, link, text, html, result) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![row.identifier, row.link, row.text, row.html, row.result],
    )?;
    Ok(conn.last_insert_rowid())
}

pub struct RunSummary {
    pub id: i64,
    pub identifier: String,
    pub link: String,
    pub case_count: usize,
    pub created_at: String,
}

pub fn fetch_runs(conn: &Connection, limit: usize) -> Result<Vec<RunSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, identifier, link, result, created_at FROM runs ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![limit as i64], |row| {
            let result: String = row.get(3)?;
            Ok(RunSummary {
                id: row.get(0)?,
                identifier: row.get(1)?,
                link: row.get(2)?,
                case_count: crate::result::test_cases(&result).len(),
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Identifier of the most recent run, used to name exports.
pub fn latest_identifier(conn: &Connection) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT identifier FROM runs ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn connect_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.sqlite");
        let conn = connect(path.to_str().unwrap()).unwrap();
        init_schema(&conn).unwrap();
        save(&conn, AI_RESULT, "Check a").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn save_then_read() {
        let conn = memory();
        assert_eq!(read(&conn, JIRA_CONTENT).unwrap(), None);
        save(&conn, JIRA_CONTENT, "1. Intro").unwrap();
        save(&conn, JIRA_CONTENT, "1. Overview").unwrap();
        assert_eq!(read(&conn, JIRA_CONTENT).unwrap().as_deref(), Some("1. Overview"));
    }

    #[test]
    fn remove_key() {
        let conn = memory();
        save(&conn, CUSTOM_PROMPT_TEMPLATE, "{CONTENT}").unwrap();
        assert!(remove(&conn, CUSTOM_PROMPT_TEMPLATE).unwrap());
        assert!(!remove(&conn, CUSTOM_PROMPT_TEMPLATE).unwrap());
        assert_eq!(read(&conn, CUSTOM_PROMPT_TEMPLATE).unwrap(), None);
    }

    #[test]
    fn runs_newest_first() {
        let conn = memory();
        for (id, result) in [("ABC-1", "Check a"), ("ABC-2", "Check a\n\nCheck b")] {
            insert_run(
                &conn,
                &RunRow {
                    identifier: id.into(),
                    link: format!("https://x/browse/{id}"),
                    text: String::new(),
                    html: String::new(),
                    result: result.into(),
                },
            )
            .unwrap();
        }
        let runs = fetch_runs(&conn, 10).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].identifier, "ABC-2");
        assert_eq!(runs[0].case_count, 2);
        assert_eq!(latest_identifier(&conn).unwrap().as_deref(), Some("ABC-2"));
    }
}
