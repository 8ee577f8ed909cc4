//! MCP server setup and lifecycle.
//!
//! Provides [`run_server`] which starts the stdio-based MCP server,
//! registering all basket tools and blocking until the client disconnects.

use std::path::PathBuf;

use basket_core::{BasketConfig, BasketError};
use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};
use tracing::info;

use crate::tools::BasketServer;

const SERVER_INSTRUCTIONS: &str = "\
basket mines transaction data for items that are bought together. Typical flow:\n\
- profile_dataset: Inspect a CSV and get suggested support thresholds\n\
- analyze_dataset: Mine frequent itemsets, association rules, and co-occurrence; returns an analysisId\n\
- get_analysis: Fetch the itemsets, rules, or co-occurrence matrix of a stored analysis\n\
- list_samples: See the built-in demo datasets\n\
- load_sample: Analyze a demo dataset\n\
- drop_analysis: Discard a stored analysis; the oldest are evicted automatically";

#[tool_handler]
impl ServerHandler for BasketServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "basket".to_string(),
                title: Some("Basket Market Basket Analysis".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Frequent itemsets and association rules from transaction data".to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}

/// Start the MCP server on stdio transport.
///
/// This is called by the `basket mcp` CLI subcommand. It blocks until
/// the client closes stdin. Relative dataset paths resolve against `root`.
///
/// # Errors
///
/// Returns [`BasketError`] if the server fails to initialize or encounters
/// a transport error.
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), basket_core::BasketError> {
/// basket_mcp::server::run_server(PathBuf::from("."), basket_core::BasketConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server(root: PathBuf, config: BasketConfig) -> Result<(), BasketError> {
    info!(root = %root.display(), "starting MCP server on stdio");
    let server = BasketServer::new(root, config);
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| BasketError::Config(format!("MCP server failed to start: {e}")))?;

    service
        .waiting()
        .await
        .map_err(|e| BasketError::Config(format!("MCP server error: {e}")))?;

    Ok(())
}
