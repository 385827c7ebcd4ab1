use crate::domain::model::{AbstractResult, OutputRecord, PublicationRecord, VenueTag};

/// DBLP type of proceedings front matter.
pub const EDITORSHIP: &str = "Editorship";

pub struct RecordFilter;

impl RecordFilter {
    /// Drops front-matter entries; everything else goes on to resolution.
    pub fn filter(records: Vec<PublicationRecord>) -> Vec<PublicationRecord> {
        let before = records.len();
        let papers: Vec<PublicationRecord> = records
            .into_iter()
            .filter(|record| record.kind != EDITORSHIP)
            .collect();

        if papers.len() != before {
            tracing::debug!("Dropped {} editorship entries", before - papers.len());
        }
        papers
    }

    /// year 與 venue 來自這次執行的設定，不是記錄本身
    pub fn shape(result: AbstractResult, year: u16, venue: VenueTag) -> OutputRecord {
        OutputRecord {
            title: result.title,
            abstract_text: result.abstract_text,
            year,
            venue,
        }
    }
}
