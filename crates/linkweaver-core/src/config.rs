//! Environment-driven configuration (§6 env vars). Loaded once at startup
//! via `dotenvy` in the server binary; this struct is the typed view
//! consumed by the rest of the crate.

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_secret_key: String,
    pub allowed_origin: String,
    pub pinecone_index: String,
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub site_domain: String,
    /// Not in §6's env var table (the spec treats the vector index as a
    /// pre-authenticated black box), but a real Pinecone client needs a
    /// credential; read optionally so deployments that inject it via the
    /// index host's own auth still start.
    pub pinecone_api_key: String,
}

impl Config {
    /// Reads each required variable from the process environment,
    /// returning a single validation error naming every variable that was
    /// missing rather than failing on the first one.
    pub fn from_env() -> Result<Self> {
        let mut missing = Vec::new();
        let read = |name: &str, missing: &mut Vec<&str>| -> String {
            std::env::var(name).unwrap_or_else(|_| {
                missing.push(name);
                String::new()
            })
        };

        let api_secret_key = read("API_SECRET_KEY", &mut missing);
        let allowed_origin = read("ALLOWED_ORIGIN", &mut missing);
        let pinecone_index = read("PINECONE_INDEX", &mut missing);
        let anthropic_api_key = read("ANTHROPIC_API_KEY", &mut missing);
        let openai_api_key = read("OPENAI_API_KEY", &mut missing);
        let site_domain = read("SITE_DOMAIN", &mut missing);
        let pinecone_api_key = std::env::var("PINECONE_API_KEY").unwrap_or_default();

        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            api_secret_key,
            allowed_origin,
            pinecone_index,
            anthropic_api_key,
            openai_api_key,
            site_domain,
            pinecone_api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_all_vars() {
        std::env::set_var("API_SECRET_KEY", "secret");
        std::env::set_var("ALLOWED_ORIGIN", "https://example.com");
        std::env::set_var("PINECONE_INDEX", "linkweaver");
        std::env::set_var("ANTHROPIC_API_KEY", "anthropic-key");
        std::env::set_var("OPENAI_API_KEY", "openai-key");
        std::env::set_var("SITE_DOMAIN", "example.com");
    }

    fn clear_all_vars() {
        for name in [
            "API_SECRET_KEY",
            "ALLOWED_ORIGIN",
            "PINECONE_INDEX",
            "ANTHROPIC_API_KEY",
            "OPENAI_API_KEY",
            "SITE_DOMAIN",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn loads_all_fields_when_present() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_all_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.site_domain, "example.com");
        clear_all_vars();
    }

    #[test]
    fn reports_all_missing_vars_at_once() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all_vars();
        let err = Config::from_env().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("API_SECRET_KEY"));
        assert!(message.contains("SITE_DOMAIN"));
    }
}
