//! Protocol handling over JSON-RPC
//!
//! Envelopes, the capability registry, the method dispatcher and the stream transport.

pub mod content;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod stdio;
