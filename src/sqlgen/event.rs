use serde_json::{Value, json};

use super::classify::QueryKind;
use super::driver::MAX_RETRIES;

/// Progress and outcome events emitted by the generation driver.
///
/// Every invocation produces a sequence of non-terminal events (raw
/// model fragments, retry and error notices) followed by exactly one
/// terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// One raw fragment of model output, forwarded as it arrives
    Fragment(String),
    /// No SQL could be extracted from the reply; another attempt follows
    RetryNotice,
    /// The database rejected the statement; another attempt follows
    /// with the error fed back into the conversation
    ExecutionError(String),
    /// Terminal: the statement kind is not allowed here
    Rejected(QueryKind),
    /// Terminal: a write statement needs an explicit confirmation flag
    ConfirmationRequired,
    /// Terminal: the retry budget ran out without a successful execution
    Exhausted,
    /// Terminal: the driver or its transport failed outright
    Fatal(String),
    /// Terminal: the query executed and returned rows
    Success { query: String, rows: Vec<Value> },
}

impl QueryEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryEvent::Rejected(_)
                | QueryEvent::ConfirmationRequired
                | QueryEvent::Exhausted
                | QueryEvent::Fatal(_)
                | QueryEvent::Success { .. }
        )
    }

    /// Render the event as the text frames sent to the caller. Most
    /// events are a single frame; success is a marker frame followed
    /// by the JSON payload.
    pub fn frames(&self) -> Vec<String> {
        match self {
            QueryEvent::Fragment(text) => vec![text.replace('\n', "\\n")],
            QueryEvent::RetryNotice => {
                vec!["[ERROR] No valid SQL query generated. Retrying...".to_string()]
            }
            QueryEvent::ExecutionError(error) => {
                vec![format!("[ERROR] SQL query failed: {}", error)]
            }
            QueryEvent::Rejected(kind) => vec![format!(
                "[ERROR] Only SELECT and WITH queries allowed. Detected: {}",
                kind
            )],
            QueryEvent::ConfirmationRequired => vec![
                "[CONFIRM] Data modification query detected. Please confirm with confirm_update=true."
                    .to_string(),
            ],
            QueryEvent::Exhausted => vec![format!(
                "[ERROR] Failed to generate and execute a valid SQL query after {} attempts.",
                MAX_RETRIES
            )],
            QueryEvent::Fatal(error) => vec![format!("[ERROR] {}", error)],
            QueryEvent::Success { query, rows } => vec![
                "[SUCCESS] SQL query executed successfully.".to_string(),
                json!({ "query": query, "data": rows }).to_string(),
            ],
        }
    }
}
