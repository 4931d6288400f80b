//! Environment configuration, read once at startup.
//! See ARCHITECTURE.md §7

/// Immutable process configuration. Built during the startup phase and handed
/// to components as constructor arguments, never read from ambient globals.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub model: String,
}

fn default_port()  -> u16    { 3000 }
fn default_model() -> String { "gemini-1.5-pro".to_string() }

impl ServerConfig {
    /// Read configuration from the environment, loading a `.env` file first
    /// when one is present. Unset or unparsable values fall back to defaults;
    /// an empty API key counts as unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_port);

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let model = std::env::var("GEMINI_MODEL_NAME").unwrap_or_else(|_| default_model());

        Self { port, gemini_api_key, model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(default_port(), 3000);
    }

    #[test]
    fn test_default_model_is_gemini() {
        assert_eq!(default_model(), "gemini-1.5-pro");
    }
}
