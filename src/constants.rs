pub const API_BASE: &str = "https://api.x.ai/v1";
pub const API_KEY_ENV_VAR: &str = "XAI_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "XAI_BASE_URL";
pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
pub const IMAGE_GENERATIONS_ENDPOINT: &str = "/images/generations";
pub const DEFAULT_CHAT_MODEL: &str = "grok-2-latest";
pub const DEFAULT_IMAGE_MODEL: &str = "grok-2-image";
