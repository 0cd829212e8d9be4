pub mod credentials;
pub mod error;
pub(crate) mod http;
pub mod tool_guard;
pub mod tools;
pub mod traits;
pub mod types;

pub use credentials::{ApiKey, Credentials};
pub use error::LlmError;
pub use http::{HttpClientConfig, Inspector, InspectorConfig};
pub use tool_guard::{ToolCallingConfig, ToolCallingGuard};
pub use tools::{FnTool, ToolRegistry};
pub use traits::{LlmProvider, ToolFunction};
pub use types::*;
