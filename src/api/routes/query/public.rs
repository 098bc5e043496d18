//! Public types for the query API
use serde::{Deserialize, Serialize};

use crate::openai::Message;

#[derive(Deserialize)]
pub struct QueryRequest {
    pub prompt: String,
    #[serde(default)]
    pub confirm_update: bool,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    pub transcript: Vec<Message>,
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<String>,
}
