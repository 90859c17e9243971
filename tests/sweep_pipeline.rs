//! Full-pipeline scenarios against the in-memory artifact service.

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use artifact_sweeper::core::session::RunSession;
use artifact_sweeper::logger::{Level, MemorySink, spawn_logger};
use artifact_sweeper::platform::MockArtifactService;
use artifact_sweeper::report::RunSummary;
use artifact_sweeper::sweep::{SweepRequest, Sweeper};
use proptest::prelude::*;

const TWO_REPOS: &str = r#"{
    "LOCAL": [{"key": "repo-a", "rclass": "local"}],
    "FEDERATED": [{"key": "repo-b", "rclass": "federated"}],
    "VIRTUAL": [{"key": "all", "rclass": "virtual"}]
}"#;

fn request(dir: &Path, exclusions: &str, dry_run: bool, threads: usize) -> SweepRequest {
    let inputs = common::write_inputs(dir, exclusions);
    SweepRequest {
        artifactory_url: "https://artifactory.example".to_string(),
        access_token: "token".to_string(),
        older_than: "90d".to_string(),
        exclusions_file: inputs.exclusions_file,
        aql_spec: inputs.aql_spec,
        dry_run,
        threads,
        output_dir: dir.to_path_buf(),
    }
}

fn sweep(
    mock: MockArtifactService,
    request: &SweepRequest,
) -> (RunSummary, Arc<MockArtifactService>, MemorySink) {
    let memory = MemorySink::new(Level::Debug);
    let (logger, join) = spawn_logger(vec![Box::new(memory.clone())], 32).unwrap();
    let mock = Arc::new(mock);
    let summary = Sweeper::new(mock.clone(), logger.clone(), RunSession::start("cli-config"))
        .run(request)
        .unwrap();
    logger.shutdown();
    join.join().unwrap();
    (summary, mock, memory)
}

/// Report rows (header excluded) as field vectors.
fn report_rows(summary: &RunSummary) -> Vec<Vec<String>> {
    let path = summary.report_file.as_ref().expect("report written");
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn paths_json(paths: &[String]) -> String {
    let items: Vec<String> = paths.iter().map(|p| format!(r#"{{"path": "{p}"}}"#)).collect();
    format!("[{}]", items.join(","))
}

#[test]
fn dry_run_scenario_skips_excluded_and_simulates_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), r#"{"exclude": ["*/ci-temp/*"]}"#, true, 4);
    let mock = MockArtifactService::new()
        .with_repositories(r#"{"LOCAL": [{"key": "builds-local", "rclass": "local"}]}"#)
        .with_search(
            "builds-local",
            r#"[{"path": "a/ci-temp/1.zip"}, {"path": "b/rel/2.zip"}]"#,
        );

    let (summary, mock, log) = sweep(mock, &req);

    let mut rows = report_rows(&summary);
    rows.sort();
    assert_eq!(
        rows,
        vec![
            vec!["builds-local", "a/ci-temp/1.zip", "skipped", "*/ci-temp/*", ""],
            vec!["builds-local", "b/rel/2.zip", "deleted", "", ""],
        ]
    );
    assert!(mock.deletes().iter().all(|(_, dry_run)| *dry_run));
    assert!(log.contains("[DRYRUN-COMPLETE]"));
    assert!(!log.contains("[DELETED]"));
    assert!(log.contains("2 artifact(s) found in builds-local. Checking exclusions..."));
    assert!(log.contains("CSV report generated:"));
    assert_eq!((summary.skipped, summary.deleted, summary.errors), (1, 1, 0));
}

#[test]
fn failed_query_contributes_no_rows_and_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), r#"{"exclude": []}"#, false, 2);
    let mock = MockArtifactService::new()
        .with_repositories(TWO_REPOS)
        .with_search_error("repo-a", "AQL: unknown field")
        .with_search(
            "repo-b",
            r#"{"results": [{"path": "x/1"}, {"path": "x/2"}, {"path": "x/3"}]}"#,
        );

    let (summary, mock, log) = sweep(mock, &req);

    let rows = report_rows(&summary);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row[0] == "repo-b"));
    assert_eq!(summary.failed_queries, 1);
    assert_eq!(summary.repositories, 2);
    assert!(log.contains("Search using spec file failed:"));
    assert!(log.contains("Processing repository: repo-b (federated)"));
    assert_eq!(
        mock.searches(),
        vec![
            ("repo-a".to_string(), "90d".to_string()),
            ("repo-b".to_string(), "90d".to_string()),
        ]
    );
}

#[test]
fn malformed_search_output_degrades_to_no_results() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), r#"{"exclude": []}"#, false, 2);
    let mock = MockArtifactService::new()
        .with_repositories(TWO_REPOS)
        .with_search("repo-a", "not json at all")
        .with_search("repo-b", r#"{"status": "ok"}"#);

    let (summary, _, log) = sweep(mock, &req);

    assert!(report_rows(&summary).is_empty());
    assert_eq!(summary.failed_queries, 0);
    assert!(log.contains("Failed to parse search response."));
    assert!(log.contains("Unexpected data format in search output."));
    assert!(log.contains("No matching artifacts found in repo-b."));
}

#[test]
fn report_is_cumulative_and_named_after_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), r#"{"exclude": ["*.keep"]}"#, false, 3);
    let mock = MockArtifactService::new()
        .with_repositories(TWO_REPOS)
        .with_search("repo-a", r#"[{"path": "a/1.jar"}, {"path": "a/2.keep"}]"#)
        .with_search("repo-b", r#"[{"path": "b/1.jar"}]"#)
        .with_delete_failure("b/1.jar", "locked");

    let (summary, _, _) = sweep(mock, &req);

    let report = summary.report_file.clone().unwrap();
    let name = report.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("clean-up-") && name.ends_with(".csv"));
    assert_eq!(common::files_with_extension(dir.path(), "csv"), vec![report.clone()]);

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.starts_with("Repository;Path;Status;Exclusion Pattern;Error\n"));
    assert!(text.contains("repo-a;a/2.keep;skipped;*.keep;"));
    assert!(text.contains("repo-a;a/1.jar;deleted;;"));
    assert!(text.contains("repo-b;b/1.jar;error;;locked"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn one_row_per_artifact_for_any_worker_count(
        a in prop::collection::btree_set("[a-z]{1,5}", 0..15),
        b in prop::collection::btree_set("[a-z]{1,5}", 0..15),
        threads in 1usize..9,
        dry_run in any::<bool>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), r#"{"exclude": ["*/m*"]}"#, dry_run, threads);
        let a_paths: Vec<String> = a.iter().map(|n| format!("a/{n}")).collect();
        let b_paths: Vec<String> = b.iter().map(|n| format!("b/{n}")).collect();
        let mock = MockArtifactService::new()
            .with_repositories(TWO_REPOS)
            .with_search("repo-a", paths_json(&a_paths))
            .with_search("repo-b", paths_json(&b_paths));

        let (summary, _, _) = sweep(mock, &req);

        let rows = report_rows(&summary);
        prop_assert_eq!(rows.len(), a_paths.len() + b_paths.len());
        prop_assert_eq!(summary.outcomes(), rows.len());
        prop_assert_eq!(summary.artifacts_found, rows.len());

        let mut seen: Vec<String> = rows.iter().map(|r| r[1].clone()).collect();
        seen.sort();
        let mut expected: Vec<String> = a_paths.iter().chain(&b_paths).cloned().collect();
        expected.sort();
        prop_assert_eq!(seen, expected);
    }
}
