//! Tools exposed to protocol clients
//!
//! Each tool pairs a descriptor (name, description, input schema) with the
//! handler that backs it. Schemas are descriptive; handlers validate their own
//! arguments.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::auth::RequestContext;
use crate::domain::calculator;
use crate::domain::profiles::ProfileLookup;
use crate::domain::resources::PROFILE_WIDGET_URI;
use crate::domain::utils::{mask_secret, optional_str, required_str, utc_timestamp};
use crate::domain::widgets::{render_profile_card, WIDGET_MIME_TYPE};
use crate::errors::ToolError;
use crate::mcp::content::{ContentBlock, ResourceContents};
use crate::mcp::registry::{ToolDescriptor, ToolHandler};

pub const ECHO_TOOL: &str = "echo";
pub const CURRENT_TIME_TOOL: &str = "get_current_time";
pub const CALCULATE_TOOL: &str = "calculate";
pub const GET_PROFILE_TOOL: &str = "get_profile";
pub const WHOAMI_TOOL: &str = "whoami";

fn descriptor(name: &str, description: &str, input_schema: Value) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

pub struct EchoTool;

impl EchoTool {
    pub fn descriptor() -> ToolDescriptor {
        descriptor(
            ECHO_TOOL,
            "Echo back the provided text",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo back"}
                },
                "required": ["text"]
            }),
        )
    }
}

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, args: Value, _ctx: &RequestContext) -> Result<Vec<ContentBlock>, ToolError> {
        let text = required_str(&args, "text")?;
        Ok(vec![ContentBlock::text(format!("Echo: {text}"))])
    }
}

pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub fn descriptor() -> ToolDescriptor {
        descriptor(
            CURRENT_TIME_TOOL,
            "Get the current time as an RFC 3339 UTC timestamp",
            json!({"type": "object", "properties": {}}),
        )
    }
}

#[async_trait]
impl ToolHandler for CurrentTimeTool {
    async fn call(&self, _args: Value, _ctx: &RequestContext) -> Result<Vec<ContentBlock>, ToolError> {
        Ok(vec![ContentBlock::text(utc_timestamp())])
    }
}

pub struct CalculateTool;

impl CalculateTool {
    pub fn descriptor() -> ToolDescriptor {
        descriptor(
            CALCULATE_TOOL,
            "Evaluate an arithmetic expression using + - * / and parentheses",
            json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "Arithmetic expression, e.g. \"2 + 3 * 4\""
                    }
                },
                "required": ["expression"]
            }),
        )
    }
}

#[async_trait]
impl ToolHandler for CalculateTool {
    async fn call(&self, args: Value, _ctx: &RequestContext) -> Result<Vec<ContentBlock>, ToolError> {
        let expression = required_str(&args, "expression")?;
        let value = calculator::evaluate(expression)?;
        Ok(vec![ContentBlock::text(format!(
            "{} = {}",
            expression.trim(),
            calculator::format_number(value)
        ))])
    }
}

pub struct GetProfileTool {
    lookup: ProfileLookup,
}

impl GetProfileTool {
    pub fn new(lookup: ProfileLookup) -> Self {
        Self { lookup }
    }

    pub fn descriptor() -> ToolDescriptor {
        descriptor(
            GET_PROFILE_TOOL,
            "Get a profile summary and its rendered profile card",
            json!({
                "type": "object",
                "properties": {
                    "profileId": {
                        "type": "string",
                        "description": "Profile id; the default profile is used when omitted"
                    }
                }
            }),
        )
    }
}

#[async_trait]
impl ToolHandler for GetProfileTool {
    async fn call(&self, args: Value, _ctx: &RequestContext) -> Result<Vec<ContentBlock>, ToolError> {
        let profile = self.lookup.resolve(optional_str(&args, "profileId")).await?;

        Ok(vec![
            ContentBlock::text(profile.summary()),
            ContentBlock::resource(ResourceContents::new(
                PROFILE_WIDGET_URI,
                WIDGET_MIME_TYPE,
                render_profile_card(&profile),
            )),
        ])
    }
}

/// Reports the caller's bearer token, masked. Fails for anonymous callers.
pub struct WhoamiTool;

impl WhoamiTool {
    pub fn descriptor() -> ToolDescriptor {
        descriptor(
            WHOAMI_TOOL,
            "Describe the credentials attached to the current request",
            json!({"type": "object", "properties": {}}),
        )
    }
}

#[async_trait]
impl ToolHandler for WhoamiTool {
    async fn call(&self, _args: Value, ctx: &RequestContext) -> Result<Vec<ContentBlock>, ToolError> {
        let token = ctx.require_bearer_token()?;
        Ok(vec![ContentBlock::text(format!(
            "Authenticated with bearer token {}",
            mask_secret(token)
        ))])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::profiles::{ProfileSettings, StaticProfileStore, DEFAULT_PROFILE_ID};

    async fn call(handler: &dyn ToolHandler, args: Value) -> Result<Vec<ContentBlock>, ToolError> {
        handler.call(args, &RequestContext::anonymous()).await
    }

    fn profile_tool() -> GetProfileTool {
        GetProfileTool::new(ProfileLookup::new(
            Arc::new(StaticProfileStore::with_fixtures()),
            ProfileSettings::default(),
        ))
    }

    #[tokio::test]
    async fn echo_prefixes_text() {
        let content = call(&EchoTool, json!({"text": "hello"})).await.expect("echo");
        assert_eq!(content, vec![ContentBlock::text("Echo: hello")]);
    }

    #[tokio::test]
    async fn echo_requires_text() {
        let err = call(&EchoTool, json!({})).await.expect_err("missing text");
        assert!(matches!(err, ToolError::MissingArgument("text")));
    }

    #[tokio::test]
    async fn current_time_is_a_utc_timestamp() {
        let content = call(&CurrentTimeTool, json!({})).await.expect("time");
        let text = content[0].as_text().expect("text block");
        assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
    }

    #[tokio::test]
    async fn calculate_evaluates_expression() {
        let content = call(&CalculateTool, json!({"expression": "2 + 3 * 4"}))
            .await
            .expect("calculation");
        assert_eq!(content[0].as_text(), Some("2 + 3 * 4 = 14"));
    }

    #[tokio::test]
    async fn calculate_rejects_bad_input() {
        for expression in ["1/0", "__proto__", "constructor"] {
            let err = call(&CalculateTool, json!({"expression": expression}))
                .await
                .expect_err("rejected expression");
            assert!(matches!(err, ToolError::InvalidInput(_)), "{expression}");
        }
        let err = call(&CalculateTool, json!({})).await.expect_err("missing");
        assert!(matches!(err, ToolError::MissingArgument("expression")));
    }

    #[tokio::test]
    async fn get_profile_without_id_returns_default() {
        let content = call(&profile_tool(), json!({})).await.expect("profile");
        assert!(content[0]
            .as_text()
            .unwrap_or_default()
            .contains(DEFAULT_PROFILE_ID));
        match &content[1] {
            ContentBlock::Resource { resource } => {
                assert_eq!(resource.uri, PROFILE_WIDGET_URI);
                assert_eq!(resource.mime_type, WIDGET_MIME_TYPE);
                assert!(resource.text.contains("Alex Rivera"));
            }
            other => panic!("expected resource block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_profile_with_unknown_id_falls_back() {
        let content = call(&profile_tool(), json!({"profileId": "nonexistent-id"}))
            .await
            .expect("fallback profile");
        assert!(content[0].as_text().unwrap_or_default().starts_with("Alex Rivera"));
    }

    #[tokio::test]
    async fn get_profile_with_known_id() {
        let content = call(&profile_tool(), json!({"profileId": "sam-okafor"}))
            .await
            .expect("profile");
        assert!(content[0].as_text().unwrap_or_default().starts_with("Sam Okafor"));
    }

    #[tokio::test]
    async fn whoami_requires_token() {
        let err = call(&WhoamiTool, json!({})).await.expect_err("anonymous");
        assert!(matches!(err, ToolError::NotAuthenticated));

        let ctx = RequestContext::with_bearer_token("secret-token-1234");
        let content = WhoamiTool.call(json!({}), &ctx).await.expect("authenticated");
        let text = content[0].as_text().unwrap_or_default();
        assert!(text.ends_with("1234"));
        assert!(!text.contains("secret"));
    }
}
