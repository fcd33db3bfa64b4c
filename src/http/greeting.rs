//! The greeting payload served on `GET /`.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::GreetingConfig;
use crate::http::server::AppState;

/// Response body of the root route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub message: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl From<&GreetingConfig> for Greeting {
    fn from(config: &GreetingConfig) -> Self {
        Self {
            message: config.message.clone(),
            version: config.version.clone(),
            environment: config.environment.clone(),
        }
    }
}

impl Default for Greeting {
    fn default() -> Self {
        Self::from(&GreetingConfig::default())
    }
}

/// `GET /`
pub async fn greet(State(state): State<AppState>) -> Json<Greeting> {
    Json(state.greeting().as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_omits_environment() {
        let body = serde_json::to_string(&Greeting::default()).unwrap();
        assert_eq!(
            body,
            r#"{"message":"Hello from DevFest GitOps Demo 🚀","version":"v1"}"#
        );
    }

    #[test]
    fn environment_serialized_last_when_set() {
        let greeting = Greeting {
            environment: Some("production".into()),
            ..Greeting::default()
        };
        let body = serde_json::to_string(&greeting).unwrap();
        assert!(body.ends_with(r#""version":"v1","environment":"production"}"#));
    }
}
