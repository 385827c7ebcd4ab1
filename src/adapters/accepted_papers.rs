use crate::domain::model::VenueTag;
use crate::domain::ports::AcceptedPapersSource;
use crate::utils::error::{HarvestError, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};

pub const DEFAULT_ACCEPTED_PAPERS_URL: &str =
    "https://www.sigsac.org/ccs/CCS{year}/program/accepted-papers.html";

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to parse table selector"));
static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to parse cell selector"));

/// Accepted-papers page laid out as a two-column table: title cell, then
/// authors cell, row after row.
#[derive(Debug, Clone)]
pub struct AcceptedPapersPage {
    client: Client,
    url_template: String,
}

impl AcceptedPapersPage {
    pub fn new(client: Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    pub fn page_url(&self, year: u16) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }

    pub async fn fetch_titles(&self, year: u16) -> Result<Vec<String>> {
        let url = self.page_url(year);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        Ok(parse_titles(&html))
    }
}

pub fn parse_titles(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut titles = Vec::new();

    for table in document.select(&TABLE) {
        // 奇數格是標題，偶數格是作者
        for cell in table.select(&CELL).step_by(2) {
            let title = cell.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                titles.push(title);
            }
        }
    }
    titles
}

impl AcceptedPapersSource for AcceptedPapersPage {
    async fn get_title_list(&self, venue: VenueTag, year: u16) -> Vec<String> {
        match self.fetch_titles(year).await {
            Ok(titles) => {
                tracing::info!(
                    "📄 {} accepted papers listed for {} {}",
                    titles.len(),
                    venue.display_name(),
                    year
                );
                titles
            }
            Err(e) => {
                tracing::warn!("⚠️ Accepted papers page for {} {} unavailable: {}", venue, year, e);
                Vec::new()
            }
        }
    }
}
