use legisbot::prelude::*;
use legisbot::source::collect_records;
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture_taxonomy() -> Taxonomy {
    Taxonomy::from_path(fixtures_dir().join("taxonomy.toml")).unwrap()
}

fn camara_source() -> ProposalSource {
    let config = ScanConfigBuilder::new(fixtures_dir().join("camara"))
        .build()
        .unwrap();
    ProposalSource::new(config)
}

#[tokio::test]
async fn test_directory_stream_reads_every_record() {
    let (records, errors) = collect_records(camara_source().process()).await;
    assert!(errors.is_empty());
    // three single-record files plus a two-item listing
    assert_eq!(records.len(), 5);

    let origins: Vec<&str> = records
        .iter()
        .filter_map(|r| r.origin.as_deref())
        .collect();
    assert_eq!(
        origins,
        vec![
            "2456789.json",
            "2460001.json",
            "2460550.json",
            "listing.json",
            "listing.json"
        ]
    );
}

#[tokio::test]
async fn test_scan_of_fixture_directory() {
    let taxonomy = fixture_taxonomy();
    let (records, _) = collect_records(camara_source().process()).await;
    let results = filter_records(records, &taxonomy);

    let summary: Vec<String> = results
        .iter()
        .map(|e| format!("{} {}", e.proposal().label(), e.priority()))
        .collect();
    insta::assert_snapshot!(summary.join(" | "), @"PEC 7/2025 critical | PL 1234/2025 high");

    // listing items carry no status, so they are reported, not scored
    assert_eq!(results.diagnostics().len(), 2);
    assert!(results
        .diagnostics()
        .iter()
        .all(|d| d.origin.as_deref() == Some("listing.json")));
}

#[tokio::test]
async fn test_naive_timestamps_read_as_brasilia_time() {
    let taxonomy = fixture_taxonomy();
    let (records, _) = collect_records(camara_source().process()).await;
    let results = filter_records(records, &taxonomy);

    let entry = results
        .iter()
        .find(|e| e.id() == "2456789")
        .unwrap();
    insta::assert_snapshot!(
        legisbot::dedupe_key(entry),
        @"2456789::2025-03-10T18:42:00+00:00"
    );
}

#[test]
fn test_max_files_limits_discovery() {
    let config = ScanConfigBuilder::new(fixtures_dir().join("camara"))
        .max_files(2)
        .build()
        .unwrap();
    let source = ProposalSource::new(config);

    let (records, errors) = tokio_test::block_on(collect_records(source.process()));
    assert!(errors.is_empty());
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_undecodable_file_does_not_stop_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.json"), "{ not json").unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{"id": "x1", "title": "Greve geral", "summary": "", "status": "voted", "last_modified": "2025-03-01T10:00:00Z"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let source = ProposalSource::new(ScanConfigBuilder::new(dir.path()).build().unwrap());
    let (records, errors) = collect_records(source.process()).await;

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::Json(_)));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.id.as_deref(), Some("x1"));
}

#[tokio::test]
async fn test_stdin_accepts_documents_and_paths() {
    let path = fixtures_dir().join("camara").join("2460001.json");
    let lines = vec![
        r#"{"id": 7, "title": "Reajuste salarial", "summary": "", "status": "voted", "last_modified": "2025-03-01"}"#.to_string(),
        String::new(),
        path.display().to_string(),
        "/no/such/file.json".to_string(),
    ];

    let (records, errors) = collect_records(ProposalSource::from_stdin(lines.into_iter())).await;
    assert!(errors.is_empty());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].origin.as_deref(), Some("stdin:1"));
    assert_eq!(records[0].record.id.as_deref(), Some("7"));
    assert_eq!(records[1].record.id.as_deref(), Some("2460001"));
}
