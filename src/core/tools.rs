use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{
    error::LlmError,
    traits::ToolFunction,
    types::{Tool, ToolCall, ToolCallResult},
};

/// Tools available to the model, keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolFunction>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn ToolFunction>) -> Result<(), LlmError> {
        let name = tool.schema().name;
        if self.tools.contains_key(&name) {
            return Err(LlmError::ToolRegistration {
                message: format!("a tool named '{name}' is already registered"),
                tool_name: name,
            });
        }

        self.tools.insert(name, tool);
        Ok(())
    }

    /// Registers a plain function over typed parameters.
    pub fn register_fn<P, R, F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<(), LlmError>
    where
        P: DeserializeOwned + schemars::JsonSchema + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> R + Send + Sync + 'static,
    {
        let tool = FnTool::new(name, description, handler)?;
        self.register(Arc::new(tool))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schemas of all registered tools, sorted by name.
    pub fn get_schemas(&self) -> Vec<Tool> {
        let mut schemas: Vec<Tool> = self.tools.values().map(|tool| tool.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolCallResult, LlmError> {
        let tool = self
            .tools
            .get(&tool_call.name)
            .ok_or_else(|| LlmError::ToolNotFound(tool_call.name.clone()))?;

        tracing::debug!(tool = %tool_call.name, call_id = %tool_call.id, "Executing tool");
        let content = tool.execute(tool_call.arguments.clone()).await?;

        Ok(ToolCallResult {
            tool_call_id: tool_call.id.clone(),
            content,
        })
    }
}

/// Adapts a closure over `Deserialize + JsonSchema` parameters into a [`ToolFunction`].
pub struct FnTool<P, R, F> {
    schema: Tool,
    handler: F,
    _signature: PhantomData<fn(P) -> R>,
}

impl<P, R, F> FnTool<P, R, F>
where
    P: DeserializeOwned + schemars::JsonSchema,
    R: Serialize,
    F: Fn(P) -> R + Send + Sync,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            schema: Tool::for_params::<P>(name, description)?,
            handler,
            _signature: PhantomData,
        })
    }
}

#[async_trait]
impl<P, R, F> ToolFunction for FnTool<P, R, F>
where
    P: DeserializeOwned + schemars::JsonSchema + 'static,
    R: Serialize + 'static,
    F: Fn(P) -> R + Send + Sync + 'static,
{
    fn schema(&self) -> Tool {
        self.schema.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<Value, LlmError> {
        let params: P = serde_json::from_value(arguments).map_err(|e| LlmError::ToolExecution {
            tool_name: self.schema.name.clone(),
            message: format!("Invalid arguments: {e}"),
            source: Some(Box::new(e)),
        })?;

        serde_json::to_value((self.handler)(params)).map_err(|e| LlmError::ToolExecution {
            tool_name: self.schema.name.clone(),
            message: format!("Failed to serialize tool output: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
