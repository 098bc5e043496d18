use anyhow::{Result, anyhow};
use std::fs;

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

pub async fn run(db: bool) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for init \"--db\""));
    }

    let config = AppConfig::default();

    println!("Initializing db...");
    fs::create_dir_all(&config.db_path)
        .unwrap_or_else(|err| println!("Ignoring db directory create failed: {}", err));

    let db = async_db(&config.db_path)
        .await
        .expect("Failed to connect to db");
    db.call(|conn| {
        initialize_db(conn).expect("DB initialization failed");
        seed_demo_data(conn).expect("DB seeding failed");
        Ok(())
    })
    .await?;
    println!("Finished initializing db");

    Ok(())
}

// A handful of rows so the query REPL has something to answer
// questions about on a fresh install
fn seed_demo_data(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r"
        INSERT OR IGNORE INTO Employee_Master VALUES
          ('EMP00042', 'Priya Raman', 'Engineering', 'priya.raman@example.com'),
          ('EMP00043', 'Dan Okafor', 'Finance', 'dan.okafor@example.com');

        INSERT OR IGNORE INTO Asset_Master VALUES
          ('AST00001', 'ThinkPad X1 Carbon', 'laptop', 'issued', 'EMP00042'),
          ('AST00002', 'Dell U2723QE', 'monitor', 'in-stock', NULL),
          ('AST00003', 'iPhone 15', 'phone', 'in-transit', 'EMP00043');

        INSERT OR IGNORE INTO Stock_Returns
          (from_empcode, assetcode, approve_status, remarks, request_time)
        VALUES
          ('EMP00043', 'AST00003', NULL, 'Leaving the company', '2025-06-01 09:30:00');
        ",
    )?;
    Ok(())
}
