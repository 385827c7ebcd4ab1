use httpmock::prelude::*;
use paper_harvest::adapters::sink::{read_dataset, Manifest, CSV_FILE, MANIFEST_FILE};
use paper_harvest::core::extract::ExtractionStrategy;
use paper_harvest::core::router::{IdentifierPlan, Route, RoutingTable, TitleSource};
use paper_harvest::domain::model::VenueTag;
use paper_harvest::domain::ports::ConfigProvider;
use paper_harvest::utils::error::HarvestError;
use paper_harvest::{
    AcceptedPapersPage, DblpClient, DirectorySink, HarvestConfig, HarvestEngine, HarvestSummary,
    LocalStorage, ResolutionPipeline,
};
use serde_json::json;
use tempfile::TempDir;

type TestPipeline =
    ResolutionPipeline<DblpClient, AcceptedPapersPage, DirectorySink<LocalStorage>, HarvestConfig>;

fn config(server: &MockServer, output: &TempDir, venue: VenueTag) -> HarvestConfig {
    let mut config = HarvestConfig::default();
    config.run.venue = venue;
    config.run.year = 2024;
    config.sources.dblp_endpoint = server.base_url();
    config.sources.semantic_scholar_endpoint = server.base_url();
    config.sources.accepted_papers_url = server.url("/ccs/CCS{year}/accepted-papers.html");
    config.resolve.concurrency = 4;
    config.output.path = output.path().to_str().unwrap().to_string();
    config
}

fn pipeline(config: HarvestConfig) -> TestPipeline {
    let client = reqwest::Client::new();
    let index = DblpClient::new(client.clone(), config.dblp_endpoint());
    let accepted = AcceptedPapersPage::new(client, config.accepted_papers_url());
    let sink = DirectorySink::new(
        LocalStorage::new(config.output_path()),
        config.output_path(),
        config.output_formats().to_vec(),
    );
    ResolutionPipeline::new(index, accepted, sink, config).unwrap()
}

async fn harvest(pipeline: TestPipeline) -> HarvestSummary {
    HarvestEngine::new(pipeline).run().await.unwrap()
}

fn mock_dblp(server: &MockServer, venue_key: &str, hits: serde_json::Value) {
    let query = format!("toc:db/conf/{key}/{key}2024.bht:", key = venue_key);
    server.mock(|when, then| {
        when.method(GET)
            .path("/search/publ/api")
            .query_param("q", query.as_str())
            .query_param("format", "json");
        then.status(200)
            .json_body(json!({"result": {"hits": {"hit": hits}}}));
    });
}

fn read_manifest(output: &TempDir) -> Manifest {
    serde_json::from_slice(&std::fs::read(output.path().join(MANIFEST_FILE)).unwrap()).unwrap()
}

#[tokio::test]
async fn test_usenix_harvest_scrapes_label_pages() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    mock_dblp(
        &server,
        "uss",
        json!([
            {"info": {"title": "USENIX Security 2024 Proceedings.", "type": "Editorship"}},
            {"info": {"title": "Good Paper.", "ee": server.url("/conference/usenixsecurity24/presentation/good"), "type": "Conference and Workshop Papers"}},
            {"info": {"title": "Gone Paper.", "ee": server.url("/conference/usenixsecurity24/presentation/gone"), "type": "Conference and Workshop Papers"}}
        ]),
    );
    server.mock(|when, then| {
        when.method(GET).path("/conference/usenixsecurity24/presentation/good");
        then.status(200).body(
            r#"<html><body>
<div class="field-label">Abstract:&nbsp;</div>
<div class="field-items"><p>We study the thing.</p></div>
</body></html>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/conference/usenixsecurity24/presentation/gone");
        then.status(404);
    });

    let summary = harvest(pipeline(config(&server, &output, VenueTag::Usenix))).await;

    assert_eq!(summary.requested, 2);
    assert_eq!(summary.resolved, 1);

    let records = read_dataset(&LocalStorage::new(output.path())).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Good Paper.");
    assert_eq!(records[0].abstract_text.as_deref(), Some("We study the thing."));
    assert_eq!(records[0].venue, VenueTag::Usenix);
    assert_eq!(records[0].year, 2024);

    let raw = std::fs::read_to_string(output.path().join("dataset.jsonl")).unwrap();
    assert!(raw.contains(r#""conf":"uss""#));
}

#[tokio::test]
async fn test_ndss_harvest_skips_author_paragraph() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    mock_dblp(
        &server,
        "ndss",
        json!([
            {"info": {"title": "NDSS Paper.", "ee": server.url("/paper/ndss-paper/"), "type": "Conference and Workshop Papers"}}
        ]),
    );
    server.mock(|when, then| {
        when.method(GET).path("/paper/ndss-paper/");
        then.status(200).body(
            r#"<div class="paper-data"><p><strong>Alice (Uni A), Bob (Uni B)</strong></p><p>The abstract body.</p></div>"#,
        );
    });

    let mut config = config(&server, &output, VenueTag::Ndss);
    config.output.formats = vec!["jsonl".to_string(), "csv".to_string()];
    let summary = harvest(pipeline(config)).await;

    assert_eq!(summary.resolved, 1);
    let records = read_dataset(&LocalStorage::new(output.path())).await.unwrap();
    assert_eq!(records[0].abstract_text.as_deref(), Some("The abstract body."));

    let csv = std::fs::read_to_string(output.path().join(CSV_FILE)).unwrap();
    assert!(csv.contains("NDSS Paper.,The abstract body.,2024,ndss"));

    let manifest = read_manifest(&output);
    assert_eq!(manifest.years, vec![2024]);
    assert_eq!(manifest.files.len(), 2);
}

#[tokio::test]
async fn test_sp_harvest_batches_by_doi() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    mock_dblp(
        &server,
        "sp",
        json!([
            {"info": {"title": "First.", "doi": "10.1109/SP.2024.1", "ee": "https://doi.org/10.1109/SP.2024.1", "type": "Conference and Workshop Papers"}},
            {"info": {"title": "Second.", "doi": "10.1109/SP.2024.2", "ee": "https://doi.org/10.1109/SP.2024.2", "type": "Conference and Workshop Papers"}},
            {"info": {"title": "Third.", "doi": "10.1109/SP.2024.3", "ee": "https://doi.org/10.1109/SP.2024.3", "type": "Conference and Workshop Papers"}}
        ]),
    );
    let batch_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graph/v1/paper/batch")
            .query_param("fields", "abstract,title")
            .json_body(json!({"ids": [
                "DOI:10.1109/SP.2024.1",
                "DOI:10.1109/SP.2024.2",
                "DOI:10.1109/SP.2024.3"
            ]}));
        then.status(200).json_body(json!([
            {"paperId": "a", "title": "First", "abstract": "First abstract."},
            null,
            {"paperId": "c", "title": "Third", "abstract": null}
        ]));
    });

    let summary = harvest(pipeline(config(&server, &output, VenueTag::Sp))).await;

    batch_mock.assert_hits(1);
    assert_eq!(summary.requested, 3);
    assert_eq!(summary.resolved, 2);

    let mut records = read_dataset(&LocalStorage::new(output.path())).await.unwrap();
    records.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "First");
    assert_eq!(records[0].abstract_text.as_deref(), Some("First abstract."));
    assert_eq!(records[1].title, "Third");
    assert_eq!(records[1].abstract_text, None);

    let manifest = read_manifest(&output);
    assert_eq!(manifest.requested, 3);
    assert_eq!(manifest.resolved, 2);
    assert_eq!(manifest.with_abstract, 1);
}

#[tokio::test]
async fn test_sp_api_fallback_counts_only_known_papers() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    mock_dblp(
        &server,
        "sp",
        json!([
            {"info": {"title": "Quiet.", "ee": server.url("/10.1109/SP.2024.7"), "type": "Conference and Workshop Papers"}},
            {"info": {"title": "Gone.", "ee": server.url("/10.1109/SP.2024.8"), "type": "Conference and Workshop Papers"}}
        ]),
    );
    server.mock(|when, then| {
        when.method(GET).path("/v1/paper/10.1109/SP.2024.7");
        then.status(200).json_body(json!({"title": "Quiet", "abstract": null}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/paper/10.1109/SP.2024.8");
        then.status(404);
    });

    let summary = harvest(pipeline(config(&server, &output, VenueTag::Sp))).await;

    assert_eq!(summary.requested, 2);
    assert_eq!(summary.resolved, 1);

    let records = read_dataset(&LocalStorage::new(output.path())).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Quiet.");
    assert_eq!(records[0].abstract_text, None);

    let manifest = read_manifest(&output);
    assert_eq!(manifest.requested, 2);
    assert_eq!(manifest.resolved, 1);
    assert_eq!(manifest.with_abstract, 0);
}

#[tokio::test]
async fn test_ccs_harvest_searches_accepted_titles() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/ccs/CCS2024/accepted-papers.html");
        then.status(200).body(
            r#"<table>
<tr><td>Matched Paper</td><td>Alice</td></tr>
<tr><td>Unknown Paper</td><td>Bob</td></tr>
</table>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/graph/v1/paper/search/match")
            .query_param("query", "Matched Paper");
        then.status(200)
            .json_body(json!({"data": [{"paperId": "s2-1"}, {"paperId": "s2-2"}]}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/graph/v1/paper/search/match")
            .query_param("query", "Unknown Paper");
        then.status(404).json_body(json!({"error": "Title match not found"}));
    });
    let batch_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graph/v1/paper/batch")
            .json_body(json!({"ids": ["s2-1"]}));
        then.status(200).json_body(json!([
            {"paperId": "s2-1", "title": "Matched Paper", "abstract": "CCS abstract."}
        ]));
    });

    let summary = harvest(pipeline(config(&server, &output, VenueTag::Ccs))).await;

    batch_mock.assert_hits(1);
    assert_eq!(summary.requested, 2);
    assert_eq!(summary.resolved, 1);

    let records = read_dataset(&LocalStorage::new(output.path())).await.unwrap();
    assert_eq!(records[0].venue, VenueTag::Ccs);
    assert_eq!(records[0].abstract_text.as_deref(), Some("CCS abstract."));

    let manifest = read_manifest(&output);
    assert_eq!(manifest.requested, 2);
    assert_eq!(manifest.resolved, 1);
}

#[tokio::test]
async fn test_ccs_harvest_keeps_known_paper_without_abstract() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/ccs/CCS2024/accepted-papers.html");
        then.status(200).body(
            r#"<table>
<tr><td>Silent Paper</td><td>Carol</td></tr>
</table>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/graph/v1/paper/search/match")
            .query_param("query", "Silent Paper");
        then.status(200).json_body(json!({"data": [{"paperId": "s2-9"}]}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/graph/v1/paper/batch")
            .json_body(json!({"ids": ["s2-9"]}));
        then.status(200)
            .json_body(json!([{"paperId": "s2-9", "title": "Silent Paper", "abstract": null}]));
    });

    let summary = harvest(pipeline(config(&server, &output, VenueTag::Ccs))).await;

    assert_eq!(summary.resolved, 1);
    let records = read_dataset(&LocalStorage::new(output.path())).await.unwrap();
    assert_eq!(records[0].title, "Silent Paper");
    assert_eq!(records[0].abstract_text, None);

    let manifest = read_manifest(&output);
    assert_eq!(manifest.resolved, 1);
    assert_eq!(manifest.with_abstract, 0);
}

#[tokio::test]
async fn test_title_search_from_index_titles() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();

    mock_dblp(
        &server,
        "ndss",
        json!([
            {"info": {"title": "Indexed Paper.", "type": "Conference and Workshop Papers"}}
        ]),
    );
    server.mock(|when, then| {
        when.method(GET)
            .path("/graph/v1/paper/search/match")
            .query_param("query", "Indexed Paper.");
        then.status(200).json_body(json!({"data": [{"paperId": "idx"}]}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/graph/v1/paper/batch");
        then.status(200)
            .json_body(json!([{"paperId": "idx", "title": "Indexed Paper", "abstract": "Found."}]));
    });

    let routes = RoutingTable::empty().with_route(Route {
        venue: VenueTag::Ndss,
        strategy: ExtractionStrategy::PaperDataContainer,
        identifiers: IdentifierPlan::TitleSearch(TitleSource::Index),
    });
    let pipeline = pipeline(config(&server, &output, VenueTag::Ndss)).with_routes(routes);
    let summary = harvest(pipeline).await;

    assert_eq!(summary.resolved, 1);
}

#[tokio::test]
async fn test_unrouted_venue_fails_before_any_request() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();
    let dblp_mock = server.mock(|when, then| {
        when.method(GET).path("/search/publ/api");
        then.status(200).json_body(json!({"result": {"hits": {}}}));
    });

    let pipeline = pipeline(config(&server, &output, VenueTag::Sp)).with_routes(RoutingTable::empty());
    let err = HarvestEngine::new(pipeline).run().await.unwrap_err();

    dblp_mock.assert_hits(0);
    assert!(matches!(err, HarvestError::UnknownVenue { .. }));
}

#[tokio::test]
async fn test_empty_index_writes_empty_dataset() {
    let server = MockServer::start();
    let output = TempDir::new().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/search/publ/api");
        then.status(503);
    });

    let summary = harvest(pipeline(config(&server, &output, VenueTag::Usenix))).await;

    assert_eq!(summary.requested, 0);
    assert_eq!(summary.resolved, 0);
    assert!(read_dataset(&LocalStorage::new(output.path()))
        .await
        .unwrap()
        .is_empty());
}
