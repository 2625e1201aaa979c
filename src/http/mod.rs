//! HTTP transport for the protocol
//!
//! Provides the external API routing: the `/mcp` endpoint plus health and discovery.

pub mod handlers;
