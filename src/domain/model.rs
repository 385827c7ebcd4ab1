use crate::utils::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 支援的會議
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueTag {
    Sp,
    Ndss,
    #[serde(rename = "uss")]
    Usenix,
    Ccs,
}

impl VenueTag {
    pub const ALL: [VenueTag; 4] = [VenueTag::Sp, VenueTag::Ndss, VenueTag::Usenix, VenueTag::Ccs];

    /// DBLP conference key, also used as the venue column of the dataset.
    pub fn key(&self) -> &'static str {
        match self {
            VenueTag::Sp => "sp",
            VenueTag::Ndss => "ndss",
            VenueTag::Usenix => "uss",
            VenueTag::Ccs => "ccs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VenueTag::Sp => "S&P",
            VenueTag::Ndss => "NDSS",
            VenueTag::Usenix => "USENIX Security",
            VenueTag::Ccs => "CCS",
        }
    }
}

impl fmt::Display for VenueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for VenueTag {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        VenueTag::ALL
            .into_iter()
            .find(|venue| venue.key() == normalized)
            .ok_or_else(|| HarvestError::UnknownVenue {
                venue: s.to_string(),
            })
    }
}

/// 從書目索引取得的原始論文記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub title: String,
    pub canonical_url: Option<String>,
    pub doi: Option<String>,
    pub venue: VenueTag,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Identifier understood by the Semantic Scholar graph API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalIdentifier(String);

impl ExternalIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_doi(doi: &str) -> Self {
        Self(format!("DOI:{}", doi.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `abstract_text == None` 是合法結果，與解析失敗（沒有結果）不同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractResult {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

/// 寫入資料集的單位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub year: u16,
    #[serde(rename = "conf")]
    pub venue: VenueTag,
}

#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub records: Vec<OutputRecord>,
    pub requested: usize,
}

impl ResolutionOutcome {
    pub fn resolved(&self) -> usize {
        self.records.len()
    }
}
