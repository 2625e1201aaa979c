//! Readable resources exposed under fixed URIs

use async_trait::async_trait;
use serde_json::json;

use crate::auth::RequestContext;
use crate::config::ServerVariant;
use crate::domain::profiles::ProfileLookup;
use crate::domain::widgets::{render_profile_card, WIDGET_MIME_TYPE};
use crate::errors::ToolError;
use crate::mcp::content::ResourceContents;
use crate::mcp::registry::{ResourceDescriptor, ResourceHandler};
use crate::mcp::server::ServerInfo;

pub const SERVER_INFO_URI: &str = "server://info";
pub const DEFAULT_PROFILE_URI: &str = "profile://default";
pub const PROFILE_DIRECTORY_URI: &str = "profile://directory";
pub const PROFILE_WIDGET_URI: &str = "ui://widget/profile-card.html";

const JSON_MIME_TYPE: &str = "application/json";

fn descriptor(uri: &str, mime_type: &str, name: &str, description: &str) -> ResourceDescriptor {
    ResourceDescriptor {
        uri: uri.to_string(),
        mime_type: mime_type.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

pub struct ServerInfoResource {
    info: ServerInfo,
    variant: ServerVariant,
    tool_names: Vec<String>,
}

impl ServerInfoResource {
    pub fn new(info: ServerInfo, variant: ServerVariant, tool_names: Vec<String>) -> Self {
        Self {
            info,
            variant,
            tool_names,
        }
    }

    pub fn descriptor() -> ResourceDescriptor {
        descriptor(
            SERVER_INFO_URI,
            JSON_MIME_TYPE,
            "Server Info",
            "Server name, version, variant and available tools",
        )
    }
}

#[async_trait]
impl ResourceHandler for ServerInfoResource {
    async fn read(&self, uri: &str, _ctx: &RequestContext) -> Result<Vec<ResourceContents>, ToolError> {
        let body = json!({
            "name": self.info.name,
            "version": self.info.version,
            "variant": self.variant.as_str(),
            "tools": self.tool_names,
        });
        Ok(vec![ResourceContents::new(uri, JSON_MIME_TYPE, body.to_string())])
    }
}

pub struct DefaultProfileResource {
    lookup: ProfileLookup,
}

impl DefaultProfileResource {
    pub fn new(lookup: ProfileLookup) -> Self {
        Self { lookup }
    }

    pub fn descriptor() -> ResourceDescriptor {
        descriptor(
            DEFAULT_PROFILE_URI,
            JSON_MIME_TYPE,
            "Default Profile",
            "The configured default profile record",
        )
    }
}

#[async_trait]
impl ResourceHandler for DefaultProfileResource {
    async fn read(&self, uri: &str, _ctx: &RequestContext) -> Result<Vec<ResourceContents>, ToolError> {
        let profile = self.lookup.default_profile().await?;
        Ok(vec![ResourceContents::new(
            uri,
            JSON_MIME_TYPE,
            json!(profile).to_string(),
        )])
    }
}

pub struct ProfileDirectoryResource {
    lookup: ProfileLookup,
}

impl ProfileDirectoryResource {
    pub fn new(lookup: ProfileLookup) -> Self {
        Self { lookup }
    }

    pub fn descriptor() -> ResourceDescriptor {
        descriptor(
            PROFILE_DIRECTORY_URI,
            JSON_MIME_TYPE,
            "Profile Directory",
            "Ids and names of all known profiles",
        )
    }
}

#[async_trait]
impl ResourceHandler for ProfileDirectoryResource {
    async fn read(&self, uri: &str, _ctx: &RequestContext) -> Result<Vec<ResourceContents>, ToolError> {
        let entries = self
            .lookup
            .list()
            .await?
            .into_iter()
            .map(|profile| json!({"id": profile.id, "name": profile.name}))
            .collect::<Vec<_>>();
        Ok(vec![ResourceContents::new(
            uri,
            JSON_MIME_TYPE,
            json!({ "profiles": entries }).to_string(),
        )])
    }
}

pub struct ProfileWidgetResource {
    lookup: ProfileLookup,
}

impl ProfileWidgetResource {
    pub fn new(lookup: ProfileLookup) -> Self {
        Self { lookup }
    }

    pub fn descriptor() -> ResourceDescriptor {
        descriptor(
            PROFILE_WIDGET_URI,
            WIDGET_MIME_TYPE,
            "Profile Card",
            "HTML card for the default profile",
        )
    }
}

#[async_trait]
impl ResourceHandler for ProfileWidgetResource {
    async fn read(&self, uri: &str, _ctx: &RequestContext) -> Result<Vec<ResourceContents>, ToolError> {
        let profile = self.lookup.default_profile().await?;
        Ok(vec![ResourceContents::new(
            uri,
            WIDGET_MIME_TYPE,
            render_profile_card(&profile),
        )])
    }
}
