use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chat::SessionStore;
use crate::core::AppConfig;
use crate::core::db::async_db;
use crate::sqlgen::{QueryEvent, generate_and_run};

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let db = async_db(&config.db_path).await?;
    let sessions = Arc::new(SessionStore::new(config.max_sessions));

    // One conversation per REPL run
    let session_id = Uuid::new_v4().to_string();

    let mut rl = DefaultEditor::new().expect("Editor failed");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let (tx, mut rx) = mpsc::unbounded_channel::<QueryEvent>();

                let printer = tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        match event {
                            QueryEvent::Fragment(text) => {
                                print!("{}", text);
                                let _ = std::io::stdout().flush();
                            }
                            other => {
                                for frame in other.frames() {
                                    println!("\n{}", frame);
                                }
                            }
                        }
                    }
                });

                let result = generate_and_run(
                    tx.clone(),
                    &sessions,
                    &db,
                    &line,
                    false,
                    &session_id,
                    &config.llm_api_hostname,
                    &config.llm_api_key,
                    &config.llm_model,
                )
                .await;

                if let Err(e) = result {
                    let _ = tx.send(QueryEvent::Fatal(format!("Something went wrong: {}", e)));
                }

                drop(tx);
                printer.await?;
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
