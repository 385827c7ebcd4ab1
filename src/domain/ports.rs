use crate::domain::model::{OutputRecord, PublicationRecord, ResolutionOutcome, VenueTag};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn venue(&self) -> VenueTag;
    fn year(&self) -> u16;
    fn dblp_endpoint(&self) -> &str;
    fn semantic_scholar_endpoint(&self) -> &str;
    fn semantic_scholar_api_key(&self) -> Option<&str>;
    fn accepted_papers_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn concurrency(&self) -> usize;
    fn batch_size(&self) -> usize;
    fn prefer_scrape(&self) -> bool;
    fn request_timeout_seconds(&self) -> Option<u64>;
}

/// 書目索引（DBLP）。任何失敗都回傳空集合。
pub trait BibliographicIndex: Send + Sync {
    fn get_records(
        &self,
        venue: VenueTag,
        year: u16,
    ) -> impl std::future::Future<Output = Vec<PublicationRecord>> + Send;
}

/// Titles scraped from a venue's "accepted papers" page.
pub trait AcceptedPapersSource: Send + Sync {
    fn get_title_list(
        &self,
        venue: VenueTag,
        year: u16,
    ) -> impl std::future::Future<Output = Vec<String>> + Send;
}

pub trait DatasetSink: Send + Sync {
    fn persist<I>(
        &self,
        records: I,
        requested: usize,
    ) -> impl std::future::Future<Output = Result<String>> + Send
    where
        I: IntoIterator<Item = OutputRecord> + Send,
        I::IntoIter: Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<PublicationRecord>>;
    async fn transform(&self, data: Vec<PublicationRecord>) -> Result<ResolutionOutcome>;
    async fn load(&self, outcome: ResolutionOutcome) -> Result<String>;
}
