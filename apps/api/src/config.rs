use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub opensearch_endpoint: String,
    pub opensearch_index: String,
    pub opensearch_username: Option<String>,
    pub opensearch_password: Option<String>,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Model used when a request does not name one.
    pub model_id: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            opensearch_endpoint: require_env("OPENSEARCH_ENDPOINT")?,
            opensearch_index: require_env("OPENSEARCH_INDEX")?,
            opensearch_username: optional_env("OPENSEARCH_USERNAME"),
            opensearch_password: optional_env("OPENSEARCH_PASSWORD"),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_region: optional_env("AWS_REGION").unwrap_or_else(|| "us-west-2".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            model_id: optional_env("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Basic-auth credentials for the search cluster, when both halves are set.
    pub fn opensearch_credentials(&self) -> Option<(String, String)> {
        match (&self.opensearch_username, &self.opensearch_password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/terminus".to_string(),
            opensearch_endpoint: "localhost:9200".to_string(),
            opensearch_index: "terminus".to_string(),
            opensearch_username: None,
            opensearch_password: None,
            s3_bucket: "terminus-test".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_region: "us-west-2".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            anthropic_api_key: "test".to_string(),
            model_id: "test-model".to_string(),
            port: 8080,
            rust_log: "debug".to_string(),
        }
    }
}
