use crate::core::LlmError;

/// Limits for the tool calling loop of `ChatClient::complete_with_tools`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallingConfig {
    /// Maximum number of requests sent in one tool calling loop (default: 10)
    pub max_iterations: u32,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

impl ToolCallingConfig {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

/// Counts loop iterations and stops a model that keeps asking for tools.
#[derive(Debug, Clone)]
pub struct ToolCallingGuard {
    pub max_iterations: u32,
    current_iteration: u32,
}

impl ToolCallingGuard {
    pub fn from_config(config: &ToolCallingConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            current_iteration: 0,
        }
    }

    /// Increment iteration count and check if limit is exceeded
    pub fn increment_iteration(&mut self) -> Result<(), LlmError> {
        self.current_iteration = self.current_iteration.saturating_add(1);
        if self.current_iteration > self.max_iterations {
            return Err(LlmError::ToolCallIterationLimit {
                limit: self.max_iterations,
            });
        }
        Ok(())
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }
}

impl Default for ToolCallingGuard {
    fn default() -> Self {
        Self::from_config(&ToolCallingConfig::default())
    }
}
