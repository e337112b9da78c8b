//! Form source and Google OAuth configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Where forms come from and how the browser's OAuth code is exchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct FormsConfig {
    /// Serve the built-in demo survey instead of calling Google
    #[serde(default)]
    pub use_demo_form: bool,

    /// Google OAuth client id
    pub google_client_id: Option<String>,

    /// Google OAuth client secret
    pub google_client_secret: Option<String>,

    /// Redirect URI registered for the OAuth client
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Forms API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OAuth token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Request timeout in seconds for the Forms API and token endpoint
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl FormsConfig {
    pub fn has_oauth_client(&self) -> bool {
        self.google_client_id.as_ref().is_some_and(|v| !v.is_empty())
            && self.google_client_secret.as_ref().is_some_and(|v| !v.is_empty())
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if production && !self.use_demo_form && !self.redirect_uri.starts_with("https://") {
            return Err(ValidationError::RedirectUriMustBeHttps);
        }
        Ok(())
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            use_demo_form: false,
            google_client_id: None,
            google_client_secret: None,
            redirect_uri: default_redirect_uri(),
            api_base_url: default_api_base_url(),
            token_url: default_token_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_redirect_uri() -> String {
    "http://localhost:5173".to_string()
}

fn default_api_base_url() -> String {
    "https://forms.googleapis.com/v1".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forms_defaults() {
        let config = FormsConfig::default();
        assert!(!config.use_demo_form);
        assert_eq!(config.api_base_url, "https://forms.googleapis.com/v1");
        assert!(!config.has_oauth_client());
    }

    #[test]
    fn test_production_requires_https_redirect() {
        let config = FormsConfig::default();
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::RedirectUriMustBeHttps)
        );

        let config = FormsConfig {
            redirect_uri: "https://survey.example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_demo_form_skips_redirect_check() {
        let config = FormsConfig {
            use_demo_form: true,
            ..Default::default()
        };
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_oauth_client_needs_both_credentials() {
        let config = FormsConfig {
            google_client_id: Some("id".to_string()),
            ..Default::default()
        };
        assert!(!config.has_oauth_client());

        let config = FormsConfig {
            google_client_id: Some("id".to_string()),
            google_client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.has_oauth_client());
    }
}
