//! Tool catalogs served by the reference backend
//!
//! The catalog is picked from the server name: `semantic_scholar` and `arxiv` each
//! expose two paper tools backed by a small fixed corpus, any other name exposes none.

use rust_mcp_sdk::{macros, schema::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[macros::mcp_tool(
    name = "search_papers",
    description = "Search for papers in Semantic Scholar"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ScholarSearchTool {
    /// Search query
    pub query: String,
    /// Year or year range
    pub year: Option<String>,
    /// Max results
    pub limit: Option<f64>,
}

#[macros::mcp_tool(
    name = "get_paper_details",
    description = "Get detailed information about a paper"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ScholarPaperDetailsTool {
    /// Semantic Scholar paper ID
    pub paper_id: String,
}

#[macros::mcp_tool(name = "search_papers", description = "Search arXiv papers")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ArxivSearchTool {
    /// Search query
    pub query: String,
    /// Max results
    pub max_results: Option<f64>,
}

#[macros::mcp_tool(name = "download_paper", description = "Download a paper by arXiv ID")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ArxivDownloadTool {
    /// arXiv ID
    pub arxiv_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScholarPaper {
    paper_id: &'static str,
    title: &'static str,
    authors: &'static [&'static str],
    year: u16,
    citation_count: u32,
    #[serde(rename = "abstract")]
    summary: &'static str,
}

#[derive(Debug, Serialize)]
struct ArxivPaper {
    id: &'static str,
    title: &'static str,
    authors: &'static [&'static str],
    published: &'static str,
    summary: &'static str,
}

static SCHOLAR_CORPUS: [ScholarPaper; 2] = [
    ScholarPaper {
        paper_id: "abc123",
        title: "Attention Is All You Need",
        authors: &["Vaswani et al."],
        year: 2017,
        citation_count: 85_000,
        summary: "The dominant sequence transduction models...",
    },
    ScholarPaper {
        paper_id: "def456",
        title: "BERT: Pre-training of Deep Bidirectional Transformers",
        authors: &["Devlin et al."],
        year: 2018,
        citation_count: 65_000,
        summary: "We introduce a new language representation model...",
    },
];

static ARXIV_CORPUS: [ArxivPaper; 1] = [ArxivPaper {
    id: "2401.12345",
    title: "Latest Advances in Transformers",
    authors: &["Smith, J.", "Doe, J."],
    published: "2024-01-15",
    summary: "We present recent improvements to transformer architecture...",
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    SemanticScholar,
    Arxiv,
    Empty,
}

impl Catalog {
    pub fn for_server(name: &str) -> Self {
        match name {
            "semantic_scholar" => Self::SemanticScholar,
            "arxiv" => Self::Arxiv,
            _ => Self::Empty,
        }
    }

    pub fn tools(self) -> Vec<Tool> {
        match self {
            Self::SemanticScholar => vec![ScholarSearchTool::tool(), ScholarPaperDetailsTool::tool()],
            Self::Arxiv => vec![ArxivSearchTool::tool(), ArxivDownloadTool::tool()],
            Self::Empty => vec![],
        }
    }

    /// Runs `tool` against the fixed corpus.
    ///
    /// Unknown tools are not an error: they produce an `{"error": ...}` payload, the
    /// same way a real backend reports tool-level failures. Only arguments that do not
    /// fit the tool's schema are rejected.
    pub fn call(self, tool: &str, arguments: Map<String, Value>) -> Result<Value, serde_json::Error> {
        let arguments = Value::Object(arguments);
        let output = match (self, tool) {
            (Self::SemanticScholar, "search_papers") => {
                let params: ScholarSearchTool = serde_json::from_value(arguments)?;
                let papers = take_limit(&SCHOLAR_CORPUS, params.limit);
                json!({ "papers": papers, "total": papers.len() })
            }
            (Self::SemanticScholar, "get_paper_details") => {
                let params: ScholarPaperDetailsTool = serde_json::from_value(arguments)?;
                match SCHOLAR_CORPUS
                    .iter()
                    .find(|paper| paper.paper_id == params.paper_id)
                {
                    Some(paper) => json!(paper),
                    None => json!({ "error": format!("Paper not found: {}", params.paper_id) }),
                }
            }
            (Self::Arxiv, "search_papers") => {
                let params: ArxivSearchTool = serde_json::from_value(arguments)?;
                let papers = take_limit(&ARXIV_CORPUS, params.max_results);
                json!({ "papers": papers, "total": papers.len() })
            }
            (Self::Arxiv, "download_paper") => {
                let params: ArxivDownloadTool = serde_json::from_value(arguments)?;
                json!({
                    "arxiv_id": params.arxiv_id,
                    "downloaded": false,
                    "message": "downloads are not available from the reference backend"
                })
            }
            _ => json!({ "error": format!("Unknown tool: {tool}") }),
        };
        Ok(output)
    }
}

/// Fractional limits truncate; negative or NaN limits select nothing.
fn take_limit<T>(corpus: &[T], limit: Option<f64>) -> &[T] {
    match limit {
        Some(limit) => &corpus[..corpus.len().min(limit as usize)],
        None => corpus,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::Catalog;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object arguments")
    }

    #[test]
    fn catalogs_follow_server_name() {
        let scholar: Vec<String> = Catalog::for_server("semantic_scholar")
            .tools()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        assert_eq!(scholar, vec!["search_papers", "get_paper_details"]);

        let arxiv: Vec<String> = Catalog::for_server("arxiv")
            .tools()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        assert_eq!(arxiv, vec!["search_papers", "download_paper"]);

        assert!(Catalog::for_server("pubmed").tools().is_empty());
    }

    #[test]
    fn scholar_search_respects_limit() {
        let output = Catalog::SemanticScholar
            .call("search_papers", args(json!({"query": "transformers", "limit": 1})))
            .expect("valid arguments");

        assert_eq!(output["total"], 1);
        assert_eq!(output["papers"][0]["paperId"], "abc123");
        assert_eq!(output["papers"][0]["citationCount"], 85_000);
        assert!(output["papers"][0]["abstract"].is_string());
    }

    #[test]
    fn numeric_limits_accept_floats_and_truncate() {
        let output = Catalog::SemanticScholar
            .call("search_papers", args(json!({"query": "transformers", "limit": 2.0})))
            .expect("float limit is accepted");
        assert_eq!(output["total"], 2);

        let output = Catalog::SemanticScholar
            .call("search_papers", args(json!({"query": "transformers", "limit": 1.7})))
            .expect("fractional limit is accepted");
        assert_eq!(output["total"], 1);

        let output = Catalog::Arxiv
            .call("search_papers", args(json!({"query": "graphs", "max_results": 0.5})))
            .expect("fractional max_results is accepted");
        assert_eq!(output["total"], 0);
    }

    #[test]
    fn paper_details_lookup() {
        let found = Catalog::SemanticScholar
            .call("get_paper_details", args(json!({"paper_id": "def456"})))
            .expect("valid arguments");
        assert_eq!(found["year"], 2018);

        let missing = Catalog::SemanticScholar
            .call("get_paper_details", args(json!({"paper_id": "zzz"})))
            .expect("valid arguments");
        assert_eq!(missing["error"], "Paper not found: zzz");
    }

    #[test]
    fn arxiv_search_returns_corpus() {
        let output = Catalog::Arxiv
            .call("search_papers", args(json!({"query": "neural networks"})))
            .expect("valid arguments");

        assert_eq!(output["total"], 1);
        assert_eq!(output["papers"][0]["id"], "2401.12345");
    }

    #[test]
    fn unknown_tool_is_reported_in_output() {
        let output = Catalog::Arxiv
            .call("get_paper_details", Map::new())
            .expect("unknown tools are not argument errors");

        assert_eq!(output["error"], "Unknown tool: get_paper_details");
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let result = Catalog::SemanticScholar.call("search_papers", args(json!({"limit": 2})));

        assert!(result.is_err());
    }
}
