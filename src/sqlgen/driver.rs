use anyhow::{Error, Result};
use tokio::sync::mpsc;
use tokio_rusqlite::Connection;

use crate::chat::SessionStore;
use crate::core::db::run_query;
use crate::openai::{Message, Role, completion_stream};

use super::classify::QueryKind;
use super::event::QueryEvent;
use super::extract::extract_sql;

/// How many generation attempts get made before giving up
pub const MAX_RETRIES: usize = 3;

const SYSTEM_PROMPT: &str = "## Primary Function
You are a READ-ONLY SQL query generator for an IT Asset Management System. Your sole purpose is to generate SELECT queries to display data. You CANNOT and WILL NOT generate INSERT, UPDATE, DELETE, or any data modification queries. Please generate SQL queries without using table aliases. Use full table names for all columns.
IMPORTANT: Do NOT use any table aliases like \"e\", \"am\", etc. in your SQL.";

const PROMPT_PREFIX: &str = "DO NOT USE ALIASES AND USE ONLY THE TABLE NAMES IN CONTEXT.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Execute,
    Reject,
    NeedsConfirmation,
}

/// Decide whether an extracted statement may be executed. The checks
/// run in a fixed order: anything that isn't a read statement is
/// rejected outright, then write statements without a confirmation
/// flag are held. The confirmation check can't currently fire because
/// the rejection check already covers every write kind; it stays in
/// place for a future write-enabled mode and its unreachability is
/// pinned by a test below.
pub fn gate(kind: QueryKind, confirm_update: bool) -> GateDecision {
    if !kind.is_read() {
        return GateDecision::Reject;
    }
    if kind.is_write() && !confirm_update {
        return GateDecision::NeedsConfirmation;
    }
    GateDecision::Execute
}

/// Turn a natural language prompt into a guarded, read-only SQL query
/// and run it.
///
/// Each attempt streams the model's reply through `tx` as
/// [`QueryEvent::Fragment`]s while accumulating it, then extracts a
/// SQL statement, classifies it, and executes it if it's a read.
/// Extraction and execution failures are retried up to [`MAX_RETRIES`]
/// times with the database error fed back into the conversation;
/// disallowed statement kinds stop the whole operation. Exactly one
/// terminal event is sent per invocation, except when this function
/// returns an error (a transport failure), in which case the caller
/// is expected to send the terminal event itself.
#[allow(clippy::too_many_arguments)]
pub async fn generate_and_run(
    tx: mpsc::UnboundedSender<QueryEvent>,
    sessions: &SessionStore,
    db: &Connection,
    prompt: &str,
    confirm_update: bool,
    session_id: &str,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<(), Error> {
    let enforced_prompt = format!("{} {}", PROMPT_PREFIX, prompt);
    sessions.append(session_id, Role::User, &enforced_prompt);

    let mut attempt = 0;
    while attempt < MAX_RETRIES {
        tracing::debug!(
            "Attempt #{} for session {}: {:?}",
            attempt + 1,
            session_id,
            enforced_prompt
        );

        let mut messages = vec![Message::new(Role::System, SYSTEM_PROMPT)];
        messages.extend(sessions.history(session_id));

        // Bridge raw fragments into typed events on the caller's
        // channel while the completion accumulates
        let (frag_tx, mut frag_rx) = mpsc::unbounded_channel::<String>();
        let forward = {
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(fragment) = frag_rx.recv().await {
                    let _ = tx.send(QueryEvent::Fragment(fragment));
                }
            })
        };
        let result = completion_stream(frag_tx, &messages, api_hostname, api_key, model).await;
        forward.await?;
        let reply = result?;

        tracing::debug!("Full model response:\n{}", reply);

        // Recorded under the user role on purpose: later attempts
        // resend replies as caller context and the prompts the model
        // sees depend on it staying that way
        sessions.append(session_id, Role::User, &reply);

        let sql = extract_sql(&reply);
        if sql.is_empty() {
            let _ = tx.send(QueryEvent::RetryNotice);
            attempt += 1;
            continue;
        }

        let kind = QueryKind::classify(&sql);
        tracing::debug!("Detected query kind {} for: {}", kind, sql);

        match gate(kind, confirm_update) {
            GateDecision::Reject => {
                let _ = tx.send(QueryEvent::Rejected(kind));
                return Ok(());
            }
            GateDecision::NeedsConfirmation => {
                let _ = tx.send(QueryEvent::ConfirmationRequired);
                return Ok(());
            }
            GateDecision::Execute => {}
        }

        match run_query(db, &sql).await {
            Ok(rows) => {
                tracing::debug!("SQL query executed successfully: {}", sql);
                let _ = tx.send(QueryEvent::Success { query: sql, rows });
                return Ok(());
            }
            Err(e) => {
                let error = e.to_string();
                tracing::debug!("SQL query failed: {}", error);
                sessions.append(
                    session_id,
                    Role::User,
                    &format!(
                        "The SQL query failed with the error:\n{}\nPlease correct and regenerate the SQL.",
                        error
                    ),
                );
                let _ = tx.send(QueryEvent::ExecutionError(error));
                attempt += 1;
            }
        }
    }

    let _ = tx.send(QueryEvent::Exhausted);
    Ok(())
}
