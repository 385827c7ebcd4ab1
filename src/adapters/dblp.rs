//! DBLP table-of-contents search, the bibliographic index for every venue.

use crate::domain::model::{PublicationRecord, VenueTag};
use crate::domain::ports::BibliographicIndex;
use crate::utils::error::{HarvestError, Result};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_DBLP_ENDPOINT: &str = "https://dblp.org";
const MAX_HITS: &str = "1000";

#[derive(Debug, Deserialize)]
struct DblpResponse {
    result: DblpResult,
}

#[derive(Debug, Deserialize)]
struct DblpResult {
    hits: DblpHits,
}

#[derive(Debug, Deserialize)]
struct DblpHits {
    #[serde(default)]
    hit: Vec<DblpHit>,
}

#[derive(Debug, Deserialize)]
struct DblpHit {
    info: Option<DblpInfo>,
}

#[derive(Debug, Deserialize)]
struct DblpInfo {
    title: Option<String>,
    #[serde(default)]
    ee: Option<OneOrMany>,
    doi: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// DBLP 的 `ee` 有時是字串，有時是陣列
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn first(self) -> Option<String> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.into_iter().next(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DblpClient {
    client: Client,
    endpoint: String,
}

impl DblpClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// `toc:db/conf/{key}/{key}{year}.bht:` selects one proceedings volume.
    pub fn toc_query(venue: VenueTag, year: u16) -> String {
        format!("toc:db/conf/{key}/{key}{year}.bht:", key = venue.key(), year = year)
    }

    pub async fn fetch_records(&self, venue: VenueTag, year: u16) -> Result<Vec<PublicationRecord>> {
        let url = format!("{}/search/publ/api", self.endpoint);
        let query = Self::toc_query(venue, year);
        tracing::debug!("📡 DBLP query: {}", query);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("h", MAX_HITS), ("format", "json")])
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
        let parsed: DblpResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .result
            .hits
            .hit
            .into_iter()
            .filter_map(|hit| hit.info)
            .filter_map(|info| {
                let title = info.title?;
                Some(PublicationRecord {
                    title,
                    canonical_url: info.ee.and_then(OneOrMany::first),
                    doi: info.doi,
                    venue,
                    kind: info.kind.unwrap_or_default(),
                })
            })
            .collect())
    }
}

impl BibliographicIndex for DblpClient {
    async fn get_records(&self, venue: VenueTag, year: u16) -> Vec<PublicationRecord> {
        match self.fetch_records(venue, year).await {
            Ok(records) => {
                tracing::info!(
                    "📚 DBLP returned {} entries for {} {}",
                    records.len(),
                    venue.display_name(),
                    year
                );
                records
            }
            Err(e) => {
                tracing::warn!("⚠️ DBLP lookup for {} {} failed: {}", venue, year, e);
                Vec::new()
            }
        }
    }
}
