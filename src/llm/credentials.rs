use crate::config::Settings;
use std::fmt;

/// Which credential scheme a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    None,
    /// Google AI Studio API key
    StaticKey,
    /// Vertex AI service account
    ServiceAccount,
}

impl AuthMode {
    /// Pick the scheme from the supplied secrets
    ///
    /// A non-empty key always wins; a service account needs both its JSON and a project.
    pub fn detect(api_key: &str, gcp_credentials: &str, gcp_project: &str) -> Self {
        if !api_key.is_empty() {
            return AuthMode::StaticKey;
        }

        if !gcp_credentials.is_empty() && !gcp_project.is_empty() {
            return AuthMode::ServiceAccount;
        }

        AuthMode::None
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::None => write!(f, "none"),
            AuthMode::StaticKey => write!(f, "Google AI Studio (API key)"),
            AuthMode::ServiceAccount => write!(f, "Vertex AI (service account)"),
        }
    }
}

/// The active credential set together with what it needs to reach an endpoint
#[derive(Clone)]
pub enum Credentials {
    StaticKey(String),
    ServiceAccount {
        credentials_json: String,
        project: String,
        location: String,
    },
}

impl Credentials {
    /// Credentials for the mode [`AuthMode::detect`] picks, if any
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        match settings.auth_mode() {
            AuthMode::StaticKey => Some(Credentials::StaticKey(settings.api_key.clone())),
            AuthMode::ServiceAccount => Some(Credentials::ServiceAccount {
                credentials_json: settings.gcp_credentials.clone(),
                project: settings.gcp_project.clone(),
                location: settings.gcp_location.clone(),
            }),
            AuthMode::None => None,
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::StaticKey(_) => AuthMode::StaticKey,
            Credentials::ServiceAccount { .. } => AuthMode::ServiceAccount,
        }
    }
}

// Secrets stay out of debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::StaticKey(_) => f.debug_tuple("StaticKey").field(&"***").finish(),
            Credentials::ServiceAccount {
                project, location, ..
            } => f
                .debug_struct("ServiceAccount")
                .field("credentials_json", &"***")
                .field("project", project)
                .field("location", location)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_static_key() {
        assert_eq!(AuthMode::detect("key", "", ""), AuthMode::StaticKey);
    }

    #[test]
    fn test_static_key_wins_over_service_account() {
        assert_eq!(AuthMode::detect("key", "{}", "proj"), AuthMode::StaticKey);
        assert_eq!(AuthMode::detect("key", "{}", ""), AuthMode::StaticKey);
        assert_eq!(AuthMode::detect("key", "", "proj"), AuthMode::StaticKey);
    }

    #[test]
    fn test_detect_service_account() {
        assert_eq!(AuthMode::detect("", "{}", "proj"), AuthMode::ServiceAccount);
    }

    #[test]
    fn test_detect_none() {
        assert_eq!(AuthMode::detect("", "", ""), AuthMode::None);
        assert_eq!(AuthMode::detect("", "{}", ""), AuthMode::None);
        assert_eq!(AuthMode::detect("", "", "proj"), AuthMode::None);
    }

    #[test]
    fn test_credentials_from_settings() {
        let settings = Settings {
            gcp_credentials: "{}".to_string(),
            gcp_project: "proj".to_string(),
            gcp_location: "global".to_string(),
            ..Settings::default()
        };

        match Credentials::from_settings(&settings) {
            Some(Credentials::ServiceAccount {
                project, location, ..
            }) => {
                assert_eq!(project, "proj");
                assert_eq!(location, "global");
            }
            other => panic!("unexpected credentials: {:?}", other),
        }

        assert!(Credentials::from_settings(&Settings::default()).is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::StaticKey("AIzaSecretKey".to_string());
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("AIzaSecretKey"));
        assert_eq!(creds.mode(), AuthMode::StaticKey);
    }
}
