use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// Credentials read from `auth.yaml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Token left over from an earlier session, used until Reddit rejects it.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ApiConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: shown.clone(),
            },
            ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                path: shown.clone(),
            },
            _ => ConfigError::Unreadable {
                path: shown.clone(),
                reason: e.to_string(),
            },
        })?;

        let config = Self::from_yaml_str(&raw)?;
        tracing::debug!("Loaded API configuration from {}", shown);
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("username", &self.username),
            ("password", &self.password),
            ("client_id", &self.client_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "user_agent".to_string(),
                    value: agent.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn cached_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Reddit rejects requests without a descriptive User-Agent.
    pub fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(agent) => agent.clone(),
            None => format!(
                "votelens/{} by {}",
                env!("CARGO_PKG_VERSION"),
                self.username
            ),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("access_token", &self.cached_token().map(|_| "[redacted]"))
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
