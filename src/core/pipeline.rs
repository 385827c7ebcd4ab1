//! Extract → transform → load for one venue/year.
//!
//! `extract` asks the bibliographic index (or the accepted-papers page) for
//! the venue's papers, `transform` resolves abstracts along the venue's
//! route, `load` hands the shaped records to the dataset sink.

use crate::core::executor::{ExecutionReport, ParallelExecutor};
use crate::core::extract::{AbstractExtractor, ExtractionStrategy, Lookup};
use crate::core::filter::RecordFilter;
use crate::core::identifier::{SemanticScholarResolver, MAX_BATCH_SIZE};
use crate::core::router::{IdentifierPlan, RoutingTable, TitleSource};
use crate::domain::model::{AbstractResult, ExternalIdentifier, PublicationRecord, ResolutionOutcome};
use crate::domain::ports::{
    AcceptedPapersSource, BibliographicIndex, ConfigProvider, DatasetSink, Pipeline,
};
use crate::utils::error::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

/// DBLP-style type given to records synthesized from an accepted-papers page.
pub const ACCEPTED_PAPER_KIND: &str = "Accepted Paper";

/// Abstracts fetched through the batch endpoint, plus how many ids were lost
/// to failed chunks or unknown to the service.
#[derive(Debug, Default)]
struct BatchReport {
    results: Vec<AbstractResult>,
    failed: usize,
    unmatched: usize,
}

pub struct ResolutionPipeline<I, A, S, C>
where
    I: BibliographicIndex,
    A: AcceptedPapersSource,
    S: DatasetSink,
    C: ConfigProvider,
{
    index: I,
    accepted: A,
    sink: S,
    config: C,
    routes: RoutingTable,
    extractor: AbstractExtractor,
    resolver: SemanticScholarResolver,
    executor: ParallelExecutor,
}

impl<I, A, S, C> ResolutionPipeline<I, A, S, C>
where
    I: BibliographicIndex,
    A: AcceptedPapersSource,
    S: DatasetSink,
    C: ConfigProvider,
{
    pub fn new(index: I, accepted: A, sink: S, config: C) -> Result<Self> {
        let client = build_client(config.request_timeout_seconds())?;
        Ok(Self::with_client(index, accepted, sink, config, client))
    }

    pub fn with_client(index: I, accepted: A, sink: S, config: C, client: Client) -> Self {
        let routes = if config.prefer_scrape() {
            RoutingTable::scrape_only()
        } else {
            RoutingTable::standard()
        };
        let extractor = AbstractExtractor::new(client.clone(), config.semantic_scholar_endpoint());
        let resolver = SemanticScholarResolver::new(client, config.semantic_scholar_endpoint())
            .with_api_key(config.semantic_scholar_api_key().map(str::to_string));
        let executor = ParallelExecutor::new(config.concurrency()).with_label(config.venue().key());

        Self {
            index,
            accepted,
            sink,
            config,
            routes,
            extractor,
            resolver,
            executor,
        }
    }

    pub fn with_routes(mut self, routes: RoutingTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_executor(mut self, executor: ParallelExecutor) -> Self {
        self.executor = executor;
        self
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size().clamp(1, MAX_BATCH_SIZE)
    }

    async fn index_records(&self) -> Vec<PublicationRecord> {
        let records = self
            .index
            .get_records(self.config.venue(), self.config.year())
            .await;
        RecordFilter::filter(records)
    }

    async fn accepted_records(&self) -> Vec<PublicationRecord> {
        let venue = self.config.venue();
        let titles = self.accepted.get_title_list(venue, self.config.year()).await;
        if titles.is_empty() {
            tracing::warn!("⚠️ No accepted papers listed, falling back to the index titles");
            return self.index_records().await;
        }

        titles
            .into_iter()
            .map(|title| PublicationRecord {
                title,
                canonical_url: None,
                doi: None,
                venue,
                kind: ACCEPTED_PAPER_KIND.to_string(),
            })
            .collect()
    }

    /// 每筆記錄各自抓頁面（或 API）取得摘要
    async fn resolve_per_record(
        &self,
        strategy: ExtractionStrategy,
        records: Vec<PublicationRecord>,
    ) -> ExecutionReport<AbstractResult> {
        let extractor = self.extractor.clone();

        self.executor
            .run(records, move |record: PublicationRecord| {
                let extractor = extractor.clone();
                async move {
                    let url = record.canonical_url.ok_or_else(|| HarvestError::Processing {
                        message: format!("'{}' has no URL to resolve", record.title),
                    })?;
                    let result = match extractor.resolve(strategy, &url).await? {
                        Lookup::Found(abstract_text) => Some(AbstractResult {
                            title: record.title,
                            abstract_text,
                        }),
                        Lookup::NotFound => None,
                    };
                    Ok::<_, HarvestError>(result)
                }
            })
            .await
    }

    async fn search_titles(
        &self,
        records: Vec<PublicationRecord>,
    ) -> ExecutionReport<(ExternalIdentifier, String)> {
        let resolver = self.resolver.clone();
        let titles: Vec<String> = records.into_iter().map(|record| record.title).collect();

        self.executor
            .run(titles, move |title: String| {
                let resolver = resolver.clone();
                async move {
                    let id = resolver.search_by_title(&title).await?;
                    Ok::<_, HarvestError>(id.map(|id| (id, title)))
                }
            })
            .await
    }

    /// Batch lookup in chunks of `batch_size`. Ids the service does not know
    /// are left out; known papers are kept even without an abstract.
    async fn fetch_batches(&self, pairs: Vec<(ExternalIdentifier, String)>) -> Result<BatchReport> {
        let mut seen = HashSet::new();
        let pairs: Vec<(ExternalIdentifier, String)> = pairs
            .into_iter()
            .filter(|(id, _)| seen.insert(id.clone()))
            .collect();

        let mut report = BatchReport::default();
        for chunk in pairs.chunks(self.batch_size()) {
            let ids: Vec<ExternalIdentifier> = chunk.iter().map(|(id, _)| id.clone()).collect();
            tracing::debug!("📦 Batch lookup of {} ids", ids.len());

            match self.resolver.batch_abstracts(&ids).await {
                Ok(mut found) => {
                    for (id, local_title) in chunk {
                        match found.remove(id).flatten() {
                            Some(result) => report.results.push(result),
                            None => {
                                report.unmatched += 1;
                                tracing::debug!("No entry for '{}' ({})", local_title, id);
                            }
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    report.failed += chunk.len();
                    tracing::error!("❌ Batch of {} ids failed: {}", chunk.len(), e);
                }
            }
        }
        Ok(report)
    }
}

/// Shared HTTP client; no timeout unless one is configured.
pub fn build_client(timeout_seconds: Option<u64>) -> Result<Client> {
    let builder = Client::builder();
    let builder = match timeout_seconds {
        Some(seconds) => builder.timeout(Duration::from_secs(seconds)),
        None => builder,
    };
    Ok(builder.build()?)
}

#[async_trait]
impl<I, A, S, C> Pipeline for ResolutionPipeline<I, A, S, C>
where
    I: BibliographicIndex,
    A: AcceptedPapersSource,
    S: DatasetSink,
    C: ConfigProvider,
{
    async fn extract(&self) -> Result<Vec<PublicationRecord>> {
        let venue = self.config.venue();
        let route = self.routes.route(venue)?;
        tracing::info!(
            "📥 Extracting {} {} papers",
            venue.display_name(),
            self.config.year()
        );

        let records = match route.title_source() {
            Some(TitleSource::AcceptedPapers) => self.accepted_records().await,
            Some(TitleSource::Index) | None => self.index_records().await,
        };
        tracing::info!("📥 {} papers to resolve", records.len());
        Ok(records)
    }

    async fn transform(&self, data: Vec<PublicationRecord>) -> Result<ResolutionOutcome> {
        let venue = self.config.venue();
        let year = self.config.year();
        let route = *self.routes.route(venue)?;
        let requested = data.len();
        tracing::info!(
            "🔀 Resolving {} papers via {:?}{} (concurrency {})",
            requested,
            route.strategy,
            if route.needs_identifier_lookup() { " after title search" } else { "" },
            self.executor.concurrency()
        );

        let (results, failed) = match route.identifiers {
            IdentifierPlan::PerRecord => {
                let report = self.resolve_per_record(route.strategy, data).await;
                (report.results, report.failed)
            }
            IdentifierPlan::Direct => {
                let (with_doi, without_doi): (Vec<_>, Vec<_>) =
                    data.into_iter().partition(|record| record.doi.is_some());
                tracing::debug!(
                    "{} records by DOI, {} through {:?}",
                    with_doi.len(),
                    without_doi.len(),
                    route.strategy
                );

                let pairs = with_doi
                    .into_iter()
                    .filter_map(|record| {
                        let id = ExternalIdentifier::from_doi(record.doi.as_deref()?);
                        Some((id, record.title))
                    })
                    .collect();
                let batch = self.fetch_batches(pairs).await?;
                if batch.unmatched > 0 {
                    tracing::info!("🔎 {} DOIs unknown to Semantic Scholar", batch.unmatched);
                }
                let report = self.resolve_per_record(route.strategy, without_doi).await;

                let mut results = batch.results;
                results.extend(report.results);
                (results, batch.failed + report.failed)
            }
            IdentifierPlan::TitleSearch(_) => {
                let search = self.search_titles(data).await;
                tracing::info!(
                    "🔎 {} of {} titles matched",
                    search.resolved(),
                    search.submitted
                );
                let batch = self.fetch_batches(search.results).await?;
                if batch.unmatched > 0 {
                    tracing::info!("🔎 {} matched ids had no batch entry", batch.unmatched);
                }
                (batch.results, batch.failed + search.failed)
            }
        };

        if failed > 0 {
            tracing::warn!("⚠️ {} papers failed to resolve", failed);
        }

        let records = results
            .into_iter()
            .map(|result| RecordFilter::shape(result, year, venue))
            .collect();
        Ok(ResolutionOutcome { records, requested })
    }

    async fn load(&self, outcome: ResolutionOutcome) -> Result<String> {
        tracing::info!(
            "💾 Saving {} records to {}",
            outcome.resolved(),
            self.config.output_path()
        );
        self.sink.persist(outcome.records, outcome.requested).await
    }
}
