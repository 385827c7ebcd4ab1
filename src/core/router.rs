use crate::core::extract::ExtractionStrategy;
use crate::domain::model::VenueTag;
use crate::utils::error::{HarvestError, Result};
use std::collections::HashMap;

/// Where the titles for a title-search venue come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Index,
    AcceptedPapers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPlan {
    /// 每筆記錄直接用 strategy 解析
    PerRecord,
    /// DOI from the record, batch lookup; records without a DOI use the strategy.
    Direct,
    /// Fuzzy title search first, then batch lookup of the matched ids.
    TitleSearch(TitleSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub venue: VenueTag,
    pub strategy: ExtractionStrategy,
    pub identifiers: IdentifierPlan,
}

impl Route {
    pub fn per_record(venue: VenueTag, strategy: ExtractionStrategy) -> Self {
        Self {
            venue,
            strategy,
            identifiers: IdentifierPlan::PerRecord,
        }
    }

    pub fn needs_identifier_lookup(&self) -> bool {
        matches!(self.identifiers, IdentifierPlan::TitleSearch(_))
    }

    pub fn title_source(&self) -> Option<TitleSource> {
        match self.identifiers {
            IdentifierPlan::TitleSearch(source) => Some(source),
            _ => None,
        }
    }
}

/// Venue → route table, built once and handed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<VenueTag, Route>,
}

impl RoutingTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::empty()
            .with_route(Route {
                venue: VenueTag::Sp,
                strategy: ExtractionStrategy::SemanticScholarApi,
                identifiers: IdentifierPlan::Direct,
            })
            .with_route(Route::per_record(
                VenueTag::Ndss,
                ExtractionStrategy::PaperDataContainer,
            ))
            .with_route(Route::per_record(
                VenueTag::Usenix,
                ExtractionStrategy::AbstractLabel,
            ))
            .with_route(Route {
                venue: VenueTag::Ccs,
                strategy: ExtractionStrategy::AbstractSection,
                identifiers: IdentifierPlan::TitleSearch(TitleSource::AcceptedPapers),
            })
    }

    /// Every venue resolved page by page with its own strategy.
    pub fn scrape_only() -> Self {
        let standard = Self::standard();
        let routes = standard
            .routes
            .into_values()
            .map(|route| (route.venue, Route::per_record(route.venue, route.strategy)))
            .collect();
        Self { routes }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.insert(route.venue, route);
        self
    }

    pub fn route(&self, venue: VenueTag) -> Result<&Route> {
        self.routes
            .get(&venue)
            .ok_or_else(|| HarvestError::UnknownVenue {
                venue: venue.key().to_string(),
            })
    }
}
