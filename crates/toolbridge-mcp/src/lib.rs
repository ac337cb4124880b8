//! MCP (Model Context Protocol) plumbing for toolbridge.
//!
//! - [`McpClient`] calls tools on a remote MCP server whose replies arrive as
//!   a server-sent-event stream.
//! - [`Dispatcher`] maps a tool call to its adapter and always answers with a
//!   [`ResponseEnvelope`](toolbridge_core::ResponseEnvelope).
//! - [`McpServer`] exposes the dispatcher over newline-delimited JSON-RPC on
//!   stdin/stdout.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod stream;
pub mod transport;

pub use client::McpClient;
pub use handlers::Dispatcher;
pub use server::McpServer;
