use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LlmError {
    /// Missing or invalid client configuration. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider rejected the credentials (HTTP 401 / 403).
    #[error("Authentication error ({status_code}): {message}")]
    Auth { message: String, status_code: u16 },

    /// Connection, send or read failure, including failures in the middle of a stream.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: BoxError,
    },

    /// A well-formed error reported by the provider (rate limit, invalid model, ...).
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        status_code: Option<u16>,
        code: Option<String>,
    },

    /// A success response whose body does not have the documented shape.
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    /// Structured output that does not conform to the requested schema.
    #[error("Schema validation error: {message}")]
    SchemaValidation {
        message: String,
        errors: Vec<String>,
    },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool registration failed for '{tool_name}': {message}")]
    ToolRegistration { tool_name: String, message: String },

    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolExecution {
        tool_name: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Tool calling exceeded maximum iterations ({limit})")]
    ToolCallIterationLimit { limit: u32 },
}

impl LlmError {
    pub(crate) fn transport(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LlmError::Transport {
            message: message.into(),
            source: source.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LlmError::Parse {
            message: message.into(),
            source: source.into(),
        }
    }

    pub(crate) fn provider(message: impl Into<String>) -> Self {
        LlmError::Provider {
            message: message.into(),
            status_code: None,
            code: None,
        }
    }

    pub(crate) fn schema_validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        LlmError::SchemaValidation {
            message: message.into(),
            errors,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, LlmError::Auth { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, LlmError::Transport { .. })
    }

    /// HTTP status reported by the provider, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::Auth { status_code, .. } => Some(*status_code),
            LlmError::Provider { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The client never retries on its own; this only classifies the failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport { .. } => true,
            LlmError::Provider {
                status_code: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
