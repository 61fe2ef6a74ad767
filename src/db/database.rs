use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::settings::PlannerSettings;

/// 策略数据在 kv_store 中的键
pub const STRATEGIES_KEY: &str = "strategies";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("portfolio_planner.db");
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                id TEXT PRIMARY KEY DEFAULT 'default',
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    pub fn save_settings(&self, settings: &PlannerSettings) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let data = serde_json::to_string(settings)?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (id, data, updated_at) VALUES ('default', ?1, datetime('now'))",
            rusqlite::params![data],
        )?;
        Ok(())
    }

    pub fn load_settings(&self) -> Result<PlannerSettings> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT data FROM settings WHERE id = 'default'",
            [],
            |row| {
                let data: String = row.get(0)?;
                Ok(data)
            },
        );
        match result {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                let default = PlannerSettings::default();
                drop(conn);
                self.save_settings(&default)?;
                Ok(default)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ====== Key-Value Methods ======

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }
}
