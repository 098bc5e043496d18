mod history;
pub use history::{HISTORY_LIMIT, SessionStore};
