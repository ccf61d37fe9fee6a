use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;

use super::response::{GraphResponse, parse_graph_response};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub focus_node: String,
    pub neighbor_level: u32,
    pub max_neighbors: u32,
    pub mandatory_nodes: Vec<String>,
}

impl FetchRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("focus_node", self.focus_node.clone()),
            ("neighbor_level", self.neighbor_level.to_string()),
            ("max_neighbors", self.max_neighbors.to_string()),
        ];
        if !self.mandatory_nodes.is_empty() {
            pairs.push(("mandatory_nodes", self.mandatory_nodes.join(",")));
        }
        pairs
    }
}

pub fn fetch_graph(client: &Client, endpoint: &str, request: &FetchRequest) -> Result<GraphResponse> {
    let response = client
        .get(endpoint)
        .query(&request.query_pairs())
        .timeout(REQUEST_TIMEOUT)
        .send()
        .with_context(|| format!("failed to reach graph endpoint {endpoint}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!(
            "graph endpoint answered {status} for focus {}",
            request.focus_node
        ));
    }

    let body = response
        .text()
        .context("graph endpoint body was not valid text")?;
    parse_graph_response(&body)
        .with_context(|| format!("failed to decode neighbor graph for {}", request.focus_node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_joins_mandatory_nodes() {
        let request = FetchRequest {
            focus_node: "b".to_owned(),
            neighbor_level: 2,
            max_neighbors: 8,
            mandatory_nodes: vec!["b".to_owned(), "a".to_owned()],
        };

        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("focus_node", "b".to_owned()));
        assert_eq!(pairs[1], ("neighbor_level", "2".to_owned()));
        assert_eq!(pairs[2], ("max_neighbors", "8".to_owned()));
        assert_eq!(pairs[3], ("mandatory_nodes", "b,a".to_owned()));
    }

    #[test]
    fn query_omits_empty_mandatory_nodes() {
        let request = FetchRequest {
            focus_node: "a".to_owned(),
            neighbor_level: 1,
            max_neighbors: 4,
            mandatory_nodes: Vec::new(),
        };

        assert_eq!(request.query_pairs().len(), 3);
    }
}
