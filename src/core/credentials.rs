use std::fmt;

use crate::constants;

use super::error::LlmError;

/// Where to take the API key from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKey {
    /// Read the key from the `XAI_API_KEY` environment variable.
    Default,
    /// Use the given key.
    Custom(String),
}

impl ApiKey {
    fn resolve(self) -> Result<String, LlmError> {
        match self {
            ApiKey::Default => std::env::var(constants::API_KEY_ENV_VAR).map_err(|_| {
                LlmError::Config(format!("{} not set.", constants::API_KEY_ENV_VAR))
            }),
            ApiKey::Custom(key) => Ok(key),
        }
    }
}

/// API key and base URL of the provider.
///
/// Validated on construction and immutable afterwards, so a client holding
/// `Credentials` never sends a request with an empty key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Credentials for the default endpoint.
    pub fn new(api_key: ApiKey) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, constants::API_BASE)
    }

    pub fn with_base_url(api_key: ApiKey, base_url: impl AsRef<str>) -> Result<Self, LlmError> {
        let api_key = api_key.resolve()?;
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key must not be empty".to_string()));
        }
        reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            LlmError::Config("API key contains characters not allowed in a header".to_string())
        })?;

        Ok(Self {
            api_key,
            base_url: normalize_base_url(base_url.as_ref())?,
        })
    }

    /// Reads `XAI_API_KEY` and, when set, `XAI_BASE_URL`.
    pub fn from_env() -> Result<Self, LlmError> {
        match std::env::var(constants::BASE_URL_ENV_VAR) {
            Ok(base_url) if !base_url.trim().is_empty() => {
                Self::with_base_url(ApiKey::Default, base_url)
            }
            _ => Self::new(ApiKey::Default),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn auth_header(&self) -> (String, String) {
        (
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )
    }
}

// Keep the key out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, LlmError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| LlmError::Config(format!("Invalid base URL '{base_url}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(LlmError::Config(format!(
            "Invalid base URL '{base_url}': scheme must be http or https"
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        let err = Credentials::new(ApiKey::Custom(String::new())).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));

        let err = Credentials::new(ApiKey::Custom("   ".to_string())).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn key_unusable_as_header_is_rejected() {
        for key in ["xai-key\n", "xai\r\nkey", "xai-\u{7f}key"] {
            let err = Credentials::new(ApiKey::Custom(key.to_string())).unwrap_err();
            match err {
                LlmError::Config(message) => assert!(message.contains("header")),
                other => panic!("expected config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn default_base_url_is_xai() {
        let creds = Credentials::new(ApiKey::Custom("xai-test".to_string())).unwrap();
        assert_eq!(creds.base_url(), "https://api.x.ai/v1");
        assert_eq!(creds.api_key(), "xai-test");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let creds = Credentials::with_base_url(
            ApiKey::Custom("k".to_string()),
            "http://localhost:8080/v1/",
        )
        .unwrap();
        assert_eq!(creds.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Credentials::with_base_url(ApiKey::Custom("k".to_string()), "not a url")
            .unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));

        let err = Credentials::with_base_url(ApiKey::Custom("k".to_string()), "ftp://x.ai/v1")
            .unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let creds = Credentials::new(ApiKey::Custom("super-secret".to_string())).unwrap();
        let printed = format!("{creds:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
