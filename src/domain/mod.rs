//! Handlers and fixtures behind the protocol
//!
//! Composes the capability registry for a server variant out of the tool and
//! resource handlers defined in the submodules.

pub mod calculator;
pub mod profiles;
pub mod resources;
pub mod tools;
pub mod utils;
pub mod widgets;

use std::sync::Arc;

use crate::config::ServerVariant;
use crate::mcp::registry::{Registry, RegistryError};
use crate::mcp::server::{Dispatcher, ServerInfo};

pub use profiles::{ProfileLookup, ProfileSettings, ProfileStore, StaticProfileStore};

use resources::{
    DefaultProfileResource, ProfileDirectoryResource, ProfileWidgetResource, ServerInfoResource,
};
use tools::{CalculateTool, CurrentTimeTool, EchoTool, GetProfileTool, WhoamiTool};

/// Builds the registry for `variant`; profile handlers share `lookup`.
pub fn build_registry(
    variant: ServerVariant,
    info: &ServerInfo,
    lookup: ProfileLookup,
) -> Result<Registry, RegistryError> {
    let mut builder = Registry::builder();

    if variant.includes_utilities() {
        builder = builder
            .tool(EchoTool::descriptor(), Arc::new(EchoTool))
            .tool(CurrentTimeTool::descriptor(), Arc::new(CurrentTimeTool))
            .tool(CalculateTool::descriptor(), Arc::new(CalculateTool));
    }

    if variant.includes_profiles() {
        builder = builder
            .tool(
                GetProfileTool::descriptor(),
                Arc::new(GetProfileTool::new(lookup.clone())),
            )
            .tool(WhoamiTool::descriptor(), Arc::new(WhoamiTool))
            .resource(
                DefaultProfileResource::descriptor(),
                Arc::new(DefaultProfileResource::new(lookup.clone())),
            )
            .resource(
                ProfileDirectoryResource::descriptor(),
                Arc::new(ProfileDirectoryResource::new(lookup.clone())),
            )
            .resource(
                ProfileWidgetResource::descriptor(),
                Arc::new(ProfileWidgetResource::new(lookup)),
            );
    }

    let tool_names = builder.tool_names();
    builder
        .resource(
            ServerInfoResource::descriptor(),
            Arc::new(ServerInfoResource::new(info.clone(), variant, tool_names)),
        )
        .build()
}

/// Dispatcher over the bundled fixture store.
pub fn build_dispatcher(
    variant: ServerVariant,
    settings: ProfileSettings,
) -> Result<Dispatcher, RegistryError> {
    let lookup = ProfileLookup::new(Arc::new(StaticProfileStore::with_fixtures()), settings);
    let info = ServerInfo::default();
    let registry = build_registry(variant, &info, lookup)?;
    Ok(Dispatcher::new(info, registry))
}
