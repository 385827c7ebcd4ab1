//! Venue-specific abstract extraction.
//!
//! Each venue publishes abstracts differently: S&P goes through the Semantic
//! Scholar REST API, the others are scraped from their paper pages. All
//! variants share one entry point, [`AbstractExtractor::resolve`], and every
//! call issues exactly one GET. HTML is parsed in synchronous helpers so the
//! (non-`Send`) DOM never lives across an await point.

use crate::utils::error::{HarvestError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Returned when the API knows the paper but has no `abstract` field at all.
pub const NO_ABSTRACT_SENTINEL: &str = "No abstract available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// `GET {s2}/v1/paper/{id}` where `id` is the record URL's path.
    SemanticScholarApi,
    /// NDSS: `div.paper-data` minus its lead-in paragraph, else the label fallback.
    PaperDataContainer,
    /// USENIX: the element following the "Abstract:" label.
    AbstractLabel,
    /// ACM DL: `div[role=paragraph]` children of `section#abstract`.
    AbstractSection,
}

/// What one extraction call learned about a paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The source knows the paper; `None` is a paper without an abstract.
    Found(Option<String>),
    /// The source has no entry for the paper.
    NotFound,
}

struct PageSelectors {
    paper_data: Selector,
    paragraph: Selector,
    abstract_section: Selector,
    role_paragraph: Selector,
}

static SELECTORS: Lazy<PageSelectors> = Lazy::new(|| PageSelectors {
    paper_data: Selector::parse("div.paper-data").expect("Failed to parse paper-data selector"),
    paragraph: Selector::parse("p").expect("Failed to parse paragraph selector"),
    abstract_section: Selector::parse("section#abstract")
        .expect("Failed to parse abstract section selector"),
    role_paragraph: Selector::parse(r#"div[role="paragraph"]"#)
        .expect("Failed to parse role=paragraph selector"),
});

static ABSTRACT_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new("Abstract:").expect("Failed to compile abstract label regex"));

#[derive(Debug, Clone)]
pub struct AbstractExtractor {
    client: Client,
    semantic_scholar_endpoint: String,
}

impl AbstractExtractor {
    pub fn new(client: Client, semantic_scholar_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            semantic_scholar_endpoint: semantic_scholar_endpoint
                .into()
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub async fn resolve(&self, strategy: ExtractionStrategy, url: &str) -> Result<Lookup> {
        tracing::debug!("URL: {} ({:?})", url, strategy);

        match strategy {
            ExtractionStrategy::SemanticScholarApi => self.resolve_from_api(url).await,
            ExtractionStrategy::PaperDataContainer => {
                let html = self.fetch_page(url).await?;
                paper_data_abstract(&html, url).map(|text| Lookup::Found(Some(text)))
            }
            ExtractionStrategy::AbstractLabel => {
                let html = self.fetch_page(url).await?;
                label_page_abstract(&html, url).map(|text| Lookup::Found(Some(text)))
            }
            ExtractionStrategy::AbstractSection => {
                let html = self.fetch_page(url).await?;
                section_abstract(&html, url).map(|text| Lookup::Found(Some(text)))
            }
        }
    }

    async fn resolve_from_api(&self, url: &str) -> Result<Lookup> {
        let id = record_id(url)?;
        let api_url = format!("{}/v1/paper/{}", self.semantic_scholar_endpoint, id);

        let response = self.client.get(&api_url).send().await?;
        if response.status() != StatusCode::OK {
            tracing::debug!("Semantic Scholar returned {} for {}", response.status(), id);
            return Ok(Lookup::NotFound);
        }

        let data: serde_json::Value = response.json().await?;
        Ok(Lookup::Found(match data.get("abstract") {
            None => Some(NO_ABSTRACT_SENTINEL.to_string()),
            Some(value) => value.as_str().map(str::to_string),
        }))
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(HarvestError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Identifier embedded in a record URL: its path without the leading slash,
/// e.g. `https://doi.org/10.1109/SP.2024.1` -> `10.1109/SP.2024.1`.
pub fn record_id(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| HarvestError::Processing {
        message: format!("Invalid record URL {}: {}", url, e),
    })?;
    let id = parsed.path().trim_start_matches('/');
    if id.is_empty() {
        return Err(HarvestError::Processing {
            message: format!("Record URL {} has no identifier path", url),
        });
    }
    Ok(id.to_string())
}

pub fn paper_data_abstract(html: &str, url: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let Some(container) = document.select(&SELECTORS.paper_data).next() else {
        return labelled_abstract(&document, url);
    };

    // 第一段是作者資訊，不是摘要
    let lead_in = container.select(&SELECTORS.paragraph).next().map(|p| p.id());
    let text: String = container
        .descendants()
        .filter(|node| lead_in.map_or(true, |skip| !node.ancestors().any(|a| a.id() == skip)))
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();

    Ok(text.trim().to_string())
}

pub fn label_page_abstract(html: &str, url: &str) -> Result<String> {
    labelled_abstract(&Html::parse_document(html), url)
}

pub fn labelled_abstract(document: &Html, url: &str) -> Result<String> {
    let missing = || HarvestError::MissingElement {
        url: url.to_string(),
        element: "\"Abstract:\" label".to_string(),
    };

    // 依文件順序：找到標籤文字後，下一個元素就是摘要
    let mut nodes = document.tree.root().descendants();
    let found = nodes.by_ref().any(|node| {
        node.value()
            .as_text()
            .is_some_and(|text| ABSTRACT_LABEL.is_match(text))
    });
    if !found {
        return Err(missing());
    }

    let next = nodes.find_map(ElementRef::wrap).ok_or_else(missing)?;
    Ok(next.text().collect::<Vec<_>>().join("\n").trim().to_string())
}

pub fn section_abstract(html: &str, url: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let section = document
        .select(&SELECTORS.abstract_section)
        .next()
        .ok_or_else(|| HarvestError::MissingElement {
            url: url.to_string(),
            element: "section#abstract".to_string(),
        })?;

    let paragraphs: Vec<String> = section
        .select(&SELECTORS.role_paragraph)
        .map(|paragraph| paragraph.text().map(str::trim).collect::<String>())
        .collect();

    Ok(paragraphs.join("\n"))
}
