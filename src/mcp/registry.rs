//! Tool registry
//!
//! Tools are registered once at startup through [`ToolRegistryBuilder`]; the
//! finished [`ToolRegistry`] is immutable and shared by every session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{McpError, Result};
use crate::mcp::schema::{ToolSchema, ValidInput};
use crate::mcp::types::{Tool, ToolAnnotations};

/// A named operation callable through `tools/call`
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &'static str;

    /// Short display title
    fn title(&self) -> &'static str;

    /// Description shown to clients
    fn description(&self) -> &'static str;

    /// Closed input schema
    fn schema(&self) -> &ToolSchema;

    /// Run the tool on arguments that already passed [`schema`](Self::schema)
    async fn call(&self, input: ValidInput) -> Result<String>;
}

/// Read-only set of tools, in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Find a tool by name
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Tool definitions for `tools/list`
    pub fn list(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| Tool {
                name: t.name().to_string(),
                title: Some(t.title().to_string()),
                description: Some(t.description().to_string()),
                input_schema: t.schema().to_json(),
                annotations: Some(ToolAnnotations::READ_ONLY_REMOTE),
            })
            .collect()
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

/// Collects tools before the registry is frozen
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistryBuilder {
    /// Add a tool; names must be unique
    pub fn register(mut self, tool: impl ToolHandler + 'static) -> Result<Self> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(McpError::DuplicateTool {
                name: tool.name().to_string(),
            }
            .into());
        }
        self.tools.push(Arc::new(tool));
        Ok(self)
    }

    /// Freeze the registry
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}
