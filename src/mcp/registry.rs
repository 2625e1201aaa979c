//! Capability registry: the declared tools and resources of one server instance
//! together with the handlers backing them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::auth::RequestContext;
use crate::errors::ToolError;
use crate::mcp::content::{ContentBlock, ResourceContents};

/// Handler trait for tools.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, ctx: &RequestContext) -> Result<Vec<ContentBlock>, ToolError>;
}

/// Handler trait for resources.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, uri: &str, ctx: &RequestContext)
        -> Result<Vec<ResourceContents>, ToolError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub mime_type: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool {0:?} is registered more than once")]
    DuplicateTool(String),
    #[error("resource {0:?} is registered more than once")]
    DuplicateResource(String),
}

/// Immutable after construction; listing order is registration order.
pub struct Registry {
    tools: Vec<ToolDescriptor>,
    tool_handlers: HashMap<String, Arc<dyn ToolHandler>>,
    resources: Vec<ResourceDescriptor>,
    resource_handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn list_resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn tool_handler(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tool_handlers.get(name)
    }

    pub fn resource_handler(&self, uri: &str) -> Option<&Arc<dyn ResourceHandler>> {
        self.resource_handlers.get(uri)
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<(ToolDescriptor, Arc<dyn ToolHandler>)>,
    resources: Vec<(ResourceDescriptor, Arc<dyn ResourceHandler>)>,
}

impl RegistryBuilder {
    /// Names of the tools registered so far, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|(descriptor, _)| descriptor.name.clone())
            .collect()
    }

    pub fn tool(mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push((descriptor, handler));
        self
    }

    pub fn resource(
        mut self,
        descriptor: ResourceDescriptor,
        handler: Arc<dyn ResourceHandler>,
    ) -> Self {
        self.resources.push((descriptor, handler));
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut tools = Vec::with_capacity(self.tools.len());
        let mut tool_handlers = HashMap::with_capacity(self.tools.len());
        for (descriptor, handler) in self.tools {
            if tool_handlers
                .insert(descriptor.name.clone(), handler)
                .is_some()
            {
                return Err(RegistryError::DuplicateTool(descriptor.name));
            }
            tools.push(descriptor);
        }

        let mut resources = Vec::with_capacity(self.resources.len());
        let mut resource_handlers = HashMap::with_capacity(self.resources.len());
        for (descriptor, handler) in self.resources {
            if resource_handlers
                .insert(descriptor.uri.clone(), handler)
                .is_some()
            {
                return Err(RegistryError::DuplicateResource(descriptor.uri));
            }
            resources.push(descriptor);
        }

        Ok(Registry {
            tools,
            tool_handlers,
            resources,
            resource_handlers,
        })
    }
}
