//! Semantic Scholar graph API: fuzzy title lookup and batched abstract fetch.

use crate::domain::model::{AbstractResult, ExternalIdentifier};
use crate::utils::error::{HarvestError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

/// Upper bound the batch endpoint accepts per request.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
struct MatchResponse {
    #[serde(default)]
    data: Vec<MatchCandidate>,
}

#[derive(Debug, Deserialize)]
struct MatchCandidate {
    #[serde(rename = "paperId")]
    paper_id: String,
}

#[derive(Debug, Clone)]
pub struct SemanticScholarResolver {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SemanticScholarResolver {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }

    /// First-ranked match wins; no candidates (or a non-200) is `Ok(None)`.
    pub async fn search_by_title(&self, title: &str) -> Result<Option<ExternalIdentifier>> {
        let url = format!("{}/graph/v1/paper/search/match", self.endpoint);
        let response = self
            .authorized(self.client.get(&url).query(&[("query", title)]))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            tracing::debug!("No title match for '{}' (status {})", title, response.status());
            return Ok(None);
        }

        let matches: MatchResponse = response.json().await?;
        let id = matches
            .data
            .into_iter()
            .next()
            .map(|candidate| ExternalIdentifier::new(candidate.paper_id));
        tracing::debug!("Title '{}' matched {:?}", title, id);
        Ok(id)
    }

    /// One entry per requested id. Ids the service does not know map to
    /// `None`; a known paper without an abstract is `Some` with no text.
    pub async fn batch_abstracts(
        &self,
        ids: &[ExternalIdentifier],
    ) -> Result<HashMap<ExternalIdentifier, Option<AbstractResult>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/graph/v1/paper/batch", self.endpoint);
        let response = self
            .authorized(
                self.client
                    .post(&url)
                    .query(&[("fields", "abstract,title")])
                    .json(&serde_json::json!({ "ids": ids })),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_batch_response(ids, &body)
    }
}

fn parse_batch_response(
    ids: &[ExternalIdentifier],
    body: &str,
) -> Result<HashMap<ExternalIdentifier, Option<AbstractResult>>> {
    let contract = |message: String| HarvestError::UpstreamContract { message };

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| contract(format!("batch response is not JSON: {}", e)))?;
    let entries = value
        .as_array()
        .ok_or_else(|| contract("batch response is not an array".to_string()))?;

    if entries.len() != ids.len() {
        return Err(contract(format!(
            "batch response has {} entries for {} ids",
            entries.len(),
            ids.len()
        )));
    }

    let mut results = HashMap::with_capacity(ids.len());
    for (id, entry) in ids.iter().zip(entries) {
        let result = match entry {
            serde_json::Value::Null => None,
            serde_json::Value::Object(paper) => Some(AbstractResult {
                title: paper
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string(),
                abstract_text: paper
                    .get("abstract")
                    .and_then(|a| a.as_str())
                    .map(str::to_string),
            }),
            other => {
                return Err(contract(format!(
                    "unexpected batch entry for {}: {}",
                    id, other
                )))
            }
        };
        results.insert(id.clone(), result);
    }

    Ok(results)
}
