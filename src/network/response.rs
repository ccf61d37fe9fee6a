use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseNode {
    pub public_key: String,
    #[serde(default)]
    pub total_up: f64,
    #[serde(default)]
    pub total_down: f64,
    #[serde(default, alias = "page_rank")]
    pub score: f64,
    #[serde(default)]
    pub total_neighbors: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub amount: f64,
}

/// One neighbor-graph answer from the trust server.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphResponse {
    #[serde(default)]
    pub user_node: Option<String>,
    pub focus_node: String,
    #[serde(default)]
    pub neighbor_level: u32,
    #[serde(default)]
    pub nodes: Vec<ResponseNode>,
    #[serde(default)]
    pub edges: Vec<ResponseEdge>,
}

pub fn parse_graph_response(raw: &str) -> Result<GraphResponse> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON from graph endpoint")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("unexpected JSON type from graph endpoint"))?;

    if !object.contains_key("focus_node") {
        return Err(anyhow!("graph response is missing focus_node"));
    }

    GraphResponse::deserialize(parsed).context("invalid graph response layout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_score_and_page_rank_spellings() {
        let raw = r#"{
            "user_node": "u",
            "focus_node": "a",
            "neighbor_level": 2,
            "nodes": [
                {"public_key": "a", "total_up": 3, "total_down": 4, "score": 0.5, "total_neighbors": 2},
                {"public_key": "b", "page_rank": 0.25}
            ],
            "edges": [{"from": "a", "to": "b", "amount": 7}]
        }"#;

        let response = parse_graph_response(raw).expect("valid response");
        assert_eq!(response.user_node.as_deref(), Some("u"));
        assert_eq!(response.neighbor_level, 2);
        assert_eq!(response.nodes.len(), 2);
        assert_eq!(
            (response.nodes[0].total_up, response.nodes[0].total_down),
            (3.0, 4.0)
        );
        assert_eq!(response.nodes[1].score, 0.25);
        assert_eq!(response.nodes[1].total_up, 0.0);
        assert_eq!(response.edges[0].amount, 7.0);
    }

    #[test]
    fn rejects_responses_without_focus() {
        assert!(parse_graph_response(r#"{"nodes": []}"#).is_err());
        assert!(parse_graph_response("[]").is_err());
        assert!(parse_graph_response("not json").is_err());
    }
}
