use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Hard ceiling on returned rows; the SQL guard clamps every statement to it.
    pub row_limit: u64,
    /// Statement timeout enforced by the executor.
    pub timeout_secs: u64,
    /// How many recent conversation turns are fed back into the prompt.
    pub max_context_turns: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("database.url", "postgresql://localhost:5432/retail")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("llm.api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.timeout_secs", 60)?
            .set_default("query.row_limit", 100)?
            .set_default("query.timeout_secs", 30)?
            .set_default("query.max_context_turns", 6)?;

        // Load from environment variables
        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(3000))?;
        }

        if let Ok(api_url) = env::var("LLM_API_URL") {
            builder = builder.set_override("llm.api_url", api_url)?;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            builder = builder.set_override("llm.api_key", Some(api_key))?;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            builder = builder.set_override("llm.model", model)?;
        }

        if let Ok(row_limit) = env::var("QUERY_ROW_LIMIT") {
            builder = builder.set_override("query.row_limit", row_limit.parse::<u64>().unwrap_or(100))?;
        }

        if let Ok(timeout) = env::var("QUERY_TIMEOUT_SECS") {
            builder = builder.set_override("query.timeout_secs", timeout.parse::<u64>().unwrap_or(30))?;
        }

        // Try to load from .env file
        let _ = dotenv::dotenv();

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        // Clear environment variables for this test
        env::remove_var("PORT");
        env::remove_var("QUERY_ROW_LIMIT");

        let config = Config::from_env().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.query.row_limit, 100);
        assert_eq!(config.query.timeout_secs, 30);
        assert_eq!(config.query.max_context_turns, 6);
    }

    #[test]
    fn test_server_address() {
        let config = Config::from_env().unwrap();
        assert!(config.server_address().contains(':'));
    }
}
