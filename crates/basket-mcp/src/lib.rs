//! MCP server interface exposing basket analysis to IDEs and agents.
//!
//! Implements a Model Context Protocol server using rmcp that exposes
//! `profile_dataset`, `analyze_dataset`, `load_sample`, `list_samples`,
//! and `get_analysis` tools over stdio transport.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), basket_core::BasketError> {
//! basket_mcp::server::run_server(PathBuf::from("."), basket_core::BasketConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod server;
pub mod tools;
