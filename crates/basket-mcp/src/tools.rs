//! Tool implementations for the basket MCP server.
//!
//! Six tools are exposed: `profile_dataset`, `analyze_dataset`,
//! `load_sample`, `list_samples`, `get_analysis`, and `drop_analysis`.
//! Completed analyses are kept in a concurrent map keyed by the id returned
//! to the client, so concurrent requests never observe each other's results.
//! The map is bounded by `output.max_stored_analyses`; the oldest ids go first.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use basket_core::{BasketConfig, BasketError, RawTable};
use basket_mining::cooccurrence::CooccurringPair;
use basket_mining::samples::{sample_dataset, SampleDataset, SAMPLES};
use basket_mining::{
    analyze, encode, profile_dataset, Analysis, AnalysisMeta, AnalysisOptions, AssociationRule,
    FrequentItemset, ThresholdSuggestions, ThresholdTier,
};
use dashmap::DashMap;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// MCP server exposing basket analysis tools.
///
/// # Examples
///
/// ```
/// use basket_core::BasketConfig;
/// use basket_mcp::tools::BasketServer;
/// use std::path::PathBuf;
///
/// let server = BasketServer::new(PathBuf::from("."), BasketConfig::default());
/// assert_eq!(server.stored_analyses(), 0);
/// ```
#[derive(Clone)]
pub struct BasketServer {
    pub(crate) root: PathBuf,
    pub(crate) config: BasketConfig,
    analyses: Arc<DashMap<u64, Arc<Analysis>>>,
    next_id: Arc<AtomicU64>,
    pub(crate) tool_router: ToolRouter<Self>,
}

// --- Parameter structs ---

/// Parameters for the `profile_dataset` tool.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ProfileDatasetParams {
    /// CSV text of the dataset. Takes precedence over `path`.
    pub csv: Option<String>,
    /// Path to a CSV file, relative to the server's root directory.
    pub path: Option<String>,
}

/// Parameters for the `analyze_dataset` tool.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeDatasetParams {
    /// CSV text of the dataset. Takes precedence over `path`.
    pub csv: Option<String>,
    /// Path to a CSV file, relative to the server's root directory.
    pub path: Option<String>,
    /// Minimum itemset support in (0, 1] (default: from config, 0.1).
    pub min_support: Option<f64>,
    /// Pick support from a suggested tier instead: "very_low", "low",
    /// "conservative", "moderate", or "strict". Overrides `min_support`.
    pub support_tier: Option<String>,
    /// Minimum rule confidence in (0, 1] (default: from config, 0.3).
    pub min_confidence: Option<f64>,
    /// Re-mine at the very_low suggestion when nothing is frequent.
    pub support_fallback: Option<bool>,
    /// Maximum itemsets, rules, and pairs in the response (default: 20).
    pub limit: Option<usize>,
}

/// Parameters for the `load_sample` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadSampleParams {
    /// Sample id: "groceries", "electronics", or "office".
    pub dataset_id: String,
    /// Maximum itemsets, rules, and pairs in the response (default: 20).
    pub limit: Option<usize>,
}

/// Parameters for the `get_analysis` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetAnalysisParams {
    /// Id returned by `analyze_dataset` or `load_sample`.
    pub analysis_id: u64,
    /// "summary" (default), "itemsets", "rules", "cooccurrence", or "all".
    pub section: Option<String>,
    /// Maximum entries for list sections (default: unlimited).
    pub limit: Option<usize>,
}

/// Parameters for the `drop_analysis` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DropAnalysisParams {
    /// Id returned by `analyze_dataset` or `load_sample`.
    pub analysis_id: u64,
}

// --- Response structs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse<'a> {
    analysis_id: u64,
    meta: &'a AnalysisMeta,
    suggestions: &'a ThresholdSuggestions,
    itemsets: Vec<&'a FrequentItemset>,
    rules: Vec<&'a AssociationRule>,
    top_pairs: Vec<CooccurringPair>,
    summary: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleListResponse {
    samples: Vec<SampleDataset>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListSection<'a, T> {
    analysis_id: u64,
    total: usize,
    entries: Vec<&'a T>,
}

fn mcp_err(msg: impl Into<String>) -> McpError {
    McpError::internal_error(msg.into(), None)
}

/// Map a domain error to an MCP error, treating bad input as invalid params.
fn basket_err(e: BasketError) -> McpError {
    match e {
        BasketError::EmptyDataset
        | BasketError::UnsupportedFormat(_)
        | BasketError::NoValidTransactions
        | BasketError::InvalidThreshold { .. }
        | BasketError::NoFrequentItemsets { .. }
        | BasketError::Parse(_)
        | BasketError::FileNotFound(_) => McpError::invalid_params(e.to_string(), None),
        other => mcp_err(other.to_string()),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| mcp_err(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl BasketServer {
    /// Create a new server reading files under `root`.
    pub fn new(root: PathBuf, config: BasketConfig) -> Self {
        Self {
            root,
            config,
            analyses: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            tool_router: Self::tool_router(),
        }
    }

    /// Number of analyses currently held.
    pub fn stored_analyses(&self) -> usize {
        self.analyses.len()
    }

    /// Fetch a stored analysis by id.
    pub fn analysis(&self, id: u64) -> Option<Arc<Analysis>> {
        self.analyses.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Store `analysis` under a fresh id, evicting the oldest entries beyond
    /// `output.max_stored_analyses`. The newest analysis is always kept.
    fn store(&self, analysis: Analysis) -> (u64, Arc<Analysis>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let analysis = Arc::new(analysis);
        self.analyses.insert(id, Arc::clone(&analysis));
        debug!(id, "stored analysis");

        let capacity = self.config.output.max_stored_analyses.max(1);
        while self.analyses.len() > capacity {
            let Some(oldest) = self.analyses.iter().map(|entry| *entry.key()).min() else {
                break;
            };
            self.analyses.remove(&oldest);
            debug!(id = oldest, "evicted analysis");
        }
        (id, analysis)
    }

    fn resolve_path(&self, path: &str) -> Result<PathBuf, McpError> {
        let canonical_root = self.root.canonicalize().map_err(|e| {
            mcp_err(format!(
                "Failed to access configured root {}: {e}",
                self.root.display()
            ))
        })?;

        let input_path = PathBuf::from(path);
        let requested_path = if input_path.is_absolute() {
            input_path
        } else {
            canonical_root.join(input_path)
        };

        let canonical_requested_path = requested_path.canonicalize().map_err(|e| {
            McpError::invalid_params(
                format!("Failed to resolve path {}: {e}", requested_path.display()),
                None,
            )
        })?;

        if !canonical_requested_path.starts_with(&canonical_root) {
            return Err(McpError::invalid_params(
                format!(
                    "Path {} is outside the configured root {}",
                    canonical_requested_path.display(),
                    canonical_root.display()
                ),
                None,
            ));
        }

        Ok(canonical_requested_path)
    }

    /// Read the dataset named by `csv` or `path`, returning a source label and the table.
    fn load_table(
        &self,
        csv: Option<&str>,
        path: Option<&str>,
    ) -> Result<(String, RawTable), McpError> {
        match (csv, path) {
            (Some(text), _) => {
                let table = basket_ingest::reader::read_table(text.as_bytes(), &self.config.ingest)
                    .map_err(basket_err)?;
                Ok(("inline csv".to_string(), table))
            }
            (None, Some(p)) => {
                let resolved = self.resolve_path(p)?;
                let table =
                    basket_ingest::reader::read_table_from_path(&resolved, &self.config.ingest)
                        .map_err(basket_err)?;
                Ok((p.to_string(), table))
            }
            (None, None) => Err(McpError::invalid_params(
                "Provide the dataset as `csv` text or a `path` to a CSV file.",
                None,
            )),
        }
    }

    fn respond(
        &self,
        id: u64,
        analysis: &Analysis,
        limit: usize,
    ) -> Result<CallToolResult, McpError> {
        let meta = &analysis.meta;
        let response = AnalysisResponse {
            analysis_id: id,
            meta,
            suggestions: &analysis.suggestions,
            itemsets: analysis.itemsets.iter().take(limit).collect(),
            rules: analysis.rules.iter().take(limit).collect(),
            top_pairs: analysis.cooccurrence.top_pairs(limit),
            summary: format!(
                "{} transactions, {} items: {} frequent itemsets at support {:.3}, {} rules at confidence {:.2}.",
                meta.n_transactions,
                meta.n_items,
                meta.n_frequent_itemsets,
                meta.min_support,
                meta.n_rules,
                meta.min_confidence,
            ),
        };
        to_json(&response)
    }

    #[tool(
        name = "profile_dataset",
        description = "Profile a transaction dataset before mining it. Detects the input layout (id/item pairs, comma-separated baskets, or one-hot columns) and reports transaction and item counts, sparsity, most and least frequent items, and five suggested support thresholds. Use this to choose min_support for analyze_dataset."
    )]
    pub fn profile_dataset(
        &self,
        Parameters(params): Parameters<ProfileDatasetParams>,
    ) -> Result<CallToolResult, McpError> {
        let (_, table) = self.load_table(params.csv.as_deref(), params.path.as_deref())?;
        let dataset = encode(&table).map_err(basket_err)?;
        to_json(&profile_dataset(&dataset))
    }

    #[tool(
        name = "analyze_dataset",
        description = "Run market basket analysis on a transaction dataset: Apriori frequent itemsets, association rules with support, confidence, lift, leverage, and conviction, and pairwise co-occurrence counts. Returns an analysisId that get_analysis accepts for the full result."
    )]
    pub fn analyze_dataset(
        &self,
        Parameters(params): Parameters<AnalyzeDatasetParams>,
    ) -> Result<CallToolResult, McpError> {
        let (source, table) = self.load_table(params.csv.as_deref(), params.path.as_deref())?;
        let dataset = encode(&table).map_err(basket_err)?;

        let mut options = AnalysisOptions::from(&self.config.analysis);
        if let Some(min_support) = params.min_support {
            options.min_support = min_support;
        }
        if let Some(tier) = &params.support_tier {
            let tier: ThresholdTier = tier
                .parse()
                .map_err(|e: String| McpError::invalid_params(e, None))?;
            options.min_support = basket_mining::suggest_thresholds(&dataset.matrix).get(tier);
        }
        if let Some(min_confidence) = params.min_confidence {
            options.min_confidence = min_confidence;
        }
        if let Some(fallback) = params.support_fallback {
            options.support_fallback = fallback;
        }

        let analysis = analyze(&source, &dataset, &options).map_err(basket_err)?;
        let (id, analysis) = self.store(analysis);
        self.respond(id, &analysis, params.limit.unwrap_or(self.config.output.limit))
    }

    #[tool(
        name = "load_sample",
        description = "Analyze one of the built-in sample datasets (groceries, electronics, office) at support 0.1 and confidence 0.3. Returns an analysisId like analyze_dataset. Use list_samples to see what is available."
    )]
    pub fn load_sample(
        &self,
        Parameters(params): Parameters<LoadSampleParams>,
    ) -> Result<CallToolResult, McpError> {
        let sample = sample_dataset(&params.dataset_id).ok_or_else(|| {
            McpError::invalid_params(
                format!(
                    "Unknown sample '{}'. Available: {}",
                    params.dataset_id,
                    SAMPLES.iter().map(|s| s.id).collect::<Vec<_>>().join(", ")
                ),
                None,
            )
        })?;
        let analysis = sample.analyze().map_err(basket_err)?;
        let (id, analysis) = self.store(analysis);
        self.respond(id, &analysis, params.limit.unwrap_or(self.config.output.limit))
    }

    #[tool(
        name = "list_samples",
        description = "List the built-in sample datasets with their ids, names, and descriptions."
    )]
    pub fn list_samples(&self) -> Result<CallToolResult, McpError> {
        to_json(&SampleListResponse {
            samples: SAMPLES.to_vec(),
        })
    }

    #[tool(
        name = "get_analysis",
        description = "Fetch a stored analysis by the analysisId from analyze_dataset or load_sample. Section selects the summary, the full frequent itemsets, the full rules with supporting transactions, the co-occurrence matrix, or everything."
    )]
    pub fn get_analysis(
        &self,
        Parameters(params): Parameters<GetAnalysisParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.analysis_id;
        let analysis = self.analysis(id).ok_or_else(|| {
            McpError::invalid_params(
                format!("No analysis with id {id}. Run analyze_dataset or load_sample first."),
                None,
            )
        })?;
        let limit = params.limit.unwrap_or(usize::MAX);

        match params.section.as_deref().unwrap_or("summary") {
            "summary" => {
                let limit = params.limit.unwrap_or(self.config.output.limit);
                self.respond(id, &analysis, limit)
            }
            "itemsets" => to_json(&ListSection {
                analysis_id: id,
                total: analysis.itemsets.len(),
                entries: analysis.itemsets.iter().take(limit).collect(),
            }),
            "rules" => to_json(&ListSection {
                analysis_id: id,
                total: analysis.rules.len(),
                entries: analysis.rules.iter().take(limit).collect(),
            }),
            "cooccurrence" => to_json(&analysis.cooccurrence),
            "all" => to_json(analysis.as_ref()),
            other => Err(McpError::invalid_params(
                format!(
                    "Unknown section '{other}'. Use summary, itemsets, rules, cooccurrence, or all."
                ),
                None,
            )),
        }
    }

    #[tool(
        name = "drop_analysis",
        description = "Discard a stored analysis by its analysisId once it is no longer needed. Older analyses are also discarded automatically when the server holds too many."
    )]
    pub fn drop_analysis(
        &self,
        Parameters(params): Parameters<DropAnalysisParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.analysis_id;
        if self.analyses.remove(&id).is_none() {
            return Err(McpError::invalid_params(
                format!("No analysis with id {id}."),
                None,
            ));
        }
        debug!(id, "dropped analysis");
        to_json(&serde_json::json!({
            "analysisId": id,
            "dropped": true,
            "remaining": self.analyses.len(),
        }))
    }
}
