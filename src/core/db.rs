//! Database connection and the verbatim query executor

use anyhow::{Error, Result};
use rusqlite::types::ValueRef;
use serde_json::Value;
use tokio_rusqlite::Connection;

/// Open the async database connection for the given storage directory
pub async fn async_db(db_path: &str) -> Result<Connection, Error> {
    let path = format!("{}/nova.db", db_path.trim_end_matches("/"));
    let conn = Connection::open(path).await?;
    Ok(conn)
}

/// Create the asset management schema if it doesn't already exist
pub fn initialize_db(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS Asset_Master (
          assetcode CHAR(8) PRIMARY KEY,
          asset_name VARCHAR(255) NOT NULL,
          category VARCHAR(64),
          status VARCHAR(32),
          assigned_to CHAR(8)
        );

        CREATE TABLE IF NOT EXISTS Employee_Master (
          empcode CHAR(8) PRIMARY KEY,
          emp_name VARCHAR(255) NOT NULL,
          department VARCHAR(64),
          email VARCHAR(255)
        );

        CREATE TABLE IF NOT EXISTS Stock_Returns (
          recid INTEGER PRIMARY KEY AUTOINCREMENT,
          from_empcode CHAR(8) NOT NULL,
          assetcode CHAR(8) NOT NULL,
          approve_status BOOLEAN,
          remarks VARCHAR(255),
          approved_by CHAR(8),
          approved_at DATETIME,
          request_time DATETIME
        );
        ",
    )?;
    Ok(())
}

/// Execute a SQL statement verbatim and return the rows as JSON
/// objects keyed by column name.
///
/// No parameterization and no statement timeout at this layer; the
/// caller is responsible for only passing statements it has already
/// vetted as read-only.
pub async fn run_query(db: &Connection, sql: &str) -> Result<Vec<Value>, Error> {
    let sql = sql.to_owned();
    let rows = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let column_names: Vec<String> = stmt
                .column_names()
                .iter()
                .map(|name| name.to_string())
                .collect();

            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut obj = serde_json::Map::new();
                for (i, name) in column_names.iter().enumerate() {
                    let value = match row.get_ref(i)? {
                        ValueRef::Null => Value::Null,
                        ValueRef::Integer(v) => Value::from(v),
                        ValueRef::Real(v) => Value::from(v),
                        ValueRef::Text(v) => Value::from(String::from_utf8_lossy(v).into_owned()),
                        ValueRef::Blob(v) => Value::from(v.to_vec()),
                    };
                    obj.insert(name.clone(), value);
                }
                out.push(Value::Object(obj));
            }
            Ok(out)
        })
        .await?;

    Ok(rows)
}
