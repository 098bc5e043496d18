//! Guarded natural-language-to-SQL generation

mod classify;
mod driver;
mod event;
mod extract;

pub use classify::QueryKind;
pub use driver::{GateDecision, MAX_RETRIES, gate, generate_and_run};
pub use event::QueryEvent;
pub use extract::extract_sql;
