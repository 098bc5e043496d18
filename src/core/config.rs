use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: String,
    pub llm_api_hostname: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub max_sessions: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let db_path = env::var("NOVA_DB_PATH").unwrap_or("./db".to_string());
        let llm_api_hostname =
            env::var("NOVA_LLM_HOST").unwrap_or_else(|_| "http://127.0.0.1:1234".to_string());
        let llm_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let llm_model = env::var("NOVA_LLM_MODEL")
            .unwrap_or_else(|_| "phi-3.1-mini-128k-instruct".to_string());
        let max_sessions = env::var("NOVA_MAX_SESSIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(256);

        Self {
            db_path,
            llm_api_hostname,
            llm_api_key,
            llm_model,
            max_sessions,
        }
    }
}
