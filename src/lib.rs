//! Luma Dream Machine as MCP tools.
//!
//! [`luma::LumaClient`] performs authenticated calls against the REST API,
//! [`tools`] turns tool arguments into requests and replies into text, and
//! [`mcp::LumaMcp`] exposes those handlers over the model context protocol.

pub mod config;
pub mod error;
pub mod luma;
pub mod mcp;
pub mod tools;

pub use config::Settings;
pub use error::{LumaError, Result};
pub use luma::LumaClient;
pub use mcp::LumaMcp;
