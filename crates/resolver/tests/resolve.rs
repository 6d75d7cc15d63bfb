//! End-to-end resolution against mock listing, API and raw endpoints

use async_trait::async_trait;
use httpmock::prelude::*;
use portpatch_errors::Error;
use portpatch_events::{channel, AppEvent, EventReceiver, PatchEvent};
use portpatch_net::NetClient;
use portpatch_resolver::{ContentsApi, DirectoryListing, DiscoveryStrategy, PatchResolver};
use portpatch_types::{PatchCandidate, PatchSource, StrategyKind};
use std::path::Path;
use tempfile::tempdir;

fn listing_page(files: &[&str]) -> String {
    files
        .iter()
        .map(|f| format!(r#"<a href="/repo/blob/master/packages/x/{f}">{f}</a>"#))
        .collect()
}

fn api_body(server: &MockServer, source: &str, files: &[&str]) -> String {
    let entries: Vec<String> = files
        .iter()
        .map(|f| {
            format!(
                r#"{{"name":"{f}","type":"file","download_url":"{}"}}"#,
                server.url(format!("/raw/{source}/{f}"))
            )
        })
        .collect();
    format!("[{}]", entries.join(","))
}

async fn mock_raw<'a>(server: &'a MockServer, source: &str, file: &str) -> httpmock::Mock<'a> {
    let body = format!("--- a/{file}\n+++ b/{file}\n");
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/raw/{source}/{file}"));
            then.status(200).body(body);
        })
        .await
}

async fn mock_listing(server: &MockServer, source: &str, status: u16, files: &[&str]) {
    let body = listing_page(files);
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/list/{source}"));
            then.status(status).body(body);
        })
        .await;
}

async fn mock_api(server: &MockServer, source: &str, status: u16, files: &[&str]) {
    let body = if status == 200 {
        api_body(server, source, files)
    } else {
        r#"{"message":"Not Found"}"#.to_string()
    };
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/{source}"));
            then.status(status)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;
}

fn build_resolver(server: &MockServer, patch_dir: &Path) -> (PatchResolver, EventReceiver) {
    let (tx, rx) = channel();
    let client = NetClient::with_defaults().unwrap();
    let suffixes = vec![".patch".to_string()];
    let raw = server.url("/raw/{source}/{file}");

    let resolver = PatchResolver::new(client.clone(), patch_dir, tx)
        .with_strategy(
            DirectoryListing::new(
                client.clone(),
                server.url("/list/{source}"),
                raw.clone(),
                suffixes.clone(),
            )
            .unwrap(),
        )
        .with_strategy(ContentsApi::new(
            client,
            server.url("/api/{source}"),
            raw,
            suffixes,
        ));
    (resolver, rx)
}

fn sources(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_file_found_by_both_strategies_is_fetched_once() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 200, &["a.patch", "b.patch", "build.sh"]).await;
    mock_api(&server, "A", 200, &["a.patch"]).await;
    let raw_a = mock_raw(&server, "A", "a.patch").await;
    let raw_b = mock_raw(&server, "A", "b.patch").await;

    let temp = tempdir().unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let report = resolver.resolve(&sources(&["A"]), "master").await.unwrap();

    assert_eq!(report.patch_set.labels(), vec!["A/a.patch", "A/b.patch"]);
    raw_a.assert_hits_async(1).await;
    raw_b.assert_hits_async(1).await;
    assert!(report.failed.is_empty());
    assert!(report.unreachable.is_empty());
}

#[tokio::test]
async fn test_order_is_source_priority_then_file_name() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 200, &["b.patch", "a.patch"]).await;
    mock_api(&server, "A", 200, &["b.patch"]).await;
    mock_listing(&server, "B", 404, &[]).await;
    mock_api(&server, "B", 200, &["c.patch"]).await;
    for (source, file) in [("A", "a.patch"), ("A", "b.patch"), ("B", "c.patch")] {
        mock_raw(&server, source, file).await;
    }

    let temp = tempdir().unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let report = resolver
        .resolve(&sources(&["A", "B"]), "master")
        .await
        .unwrap();

    assert_eq!(
        report.patch_set.labels(),
        vec!["A/a.patch", "A/b.patch", "B/c.patch"]
    );
}

#[tokio::test]
async fn test_downloads_keep_source_provenance() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "nodejs-lts", 200, &["fix.patch"]).await;
    mock_api(&server, "nodejs-lts", 200, &[]).await;
    mock_raw(&server, "nodejs-lts", "fix.patch").await;

    let temp = tempdir().unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let report = resolver
        .resolve(&sources(&["nodejs-lts"]), "master")
        .await
        .unwrap();

    let patch = report.patch_set.iter().next().unwrap();
    assert_eq!(patch.path, temp.path().join("nodejs-lts").join("fix.patch"));
    let contents = std::fs::read(&patch.path).unwrap();
    assert_eq!(
        patch.digest.as_deref(),
        Some(blake3::hash(&contents).to_hex().as_str())
    );
}

#[tokio::test]
async fn test_unreachable_source_contributes_nothing() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "gone", 404, &[]).await;
    mock_api(&server, "gone", 404, &[]).await;

    let temp = tempdir().unwrap();
    let (resolver, mut rx) = build_resolver(&server, temp.path());
    let report = resolver
        .resolve(&sources(&["gone"]), "master")
        .await
        .unwrap();

    assert!(report.patch_set.is_empty());
    assert_eq!(report.unreachable, vec!["gone"]);

    let mut saw_unreachable = false;
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::Patch(PatchEvent::SourceUnreachable { source }) = event {
            assert_eq!(source, "gone");
            saw_unreachable = true;
        }
    }
    assert!(saw_unreachable);
}

#[tokio::test]
async fn test_empty_source_is_not_unreachable() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 200, &["build.sh"]).await;
    mock_api(&server, "A", 200, &[]).await;

    let temp = tempdir().unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let report = resolver.resolve(&sources(&["A"]), "master").await.unwrap();

    assert!(report.patch_set.is_empty());
    assert!(report.unreachable.is_empty());
}

#[tokio::test]
async fn test_failed_download_is_dropped_and_others_continue() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 200, &["a.patch", "b.patch", "c.patch"]).await;
    mock_api(&server, "A", 200, &[]).await;
    mock_raw(&server, "A", "a.patch").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/raw/A/b.patch");
            then.status(500);
        })
        .await;
    mock_raw(&server, "A", "c.patch").await;

    let temp = tempdir().unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let report = resolver.resolve(&sources(&["A"]), "master").await.unwrap();

    assert_eq!(report.patch_set.labels(), vec!["A/a.patch", "A/c.patch"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file_name, "b.patch");
    assert!(!temp.path().join("A").join("b.patch").exists());
    assert!(!temp.path().join("A").join("b.patch.part").exists());
}

#[tokio::test]
async fn test_stale_patches_are_removed_before_resolving() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 200, &[]).await;
    mock_api(&server, "A", 200, &[]).await;

    let temp = tempdir().unwrap();
    let source_dir = temp.path().join("A");
    std::fs::create_dir_all(&source_dir).unwrap();
    let stale = source_dir.join("stale.patch");
    let partial = source_dir.join("half.patch.part");
    std::fs::write(&stale, "stale").unwrap();
    std::fs::write(&partial, "half").unwrap();

    let (resolver, _rx) = build_resolver(&server, temp.path());
    resolver.resolve(&sources(&["A"]), "master").await.unwrap();
    assert!(!stale.exists());
    assert!(!partial.exists());

    std::fs::write(&stale, "stale").unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let resolver = resolver.with_clean_patch_dir(false);
    resolver.resolve(&sources(&["A"]), "master").await.unwrap();
    assert!(stale.exists());
}

#[tokio::test]
async fn test_cleaning_leaves_unrelated_files_alone() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 200, &[]).await;
    mock_api(&server, "A", 200, &[]).await;

    let temp = tempdir().unwrap();
    let top_level = temp.path().join("notes.patch");
    let readme = temp.path().join("README");
    let source_dir = temp.path().join("A");
    std::fs::create_dir_all(&source_dir).unwrap();
    let build_script = source_dir.join("build.sh");
    for file in [&top_level, &readme, &build_script] {
        std::fs::write(file, "keep").unwrap();
    }

    let (resolver, _rx) = build_resolver(&server, temp.path());
    resolver.resolve(&sources(&["A"]), "master").await.unwrap();

    assert!(top_level.exists());
    assert!(readme.exists());
    assert!(build_script.exists());
}

#[tokio::test]
async fn test_sources_with_overlapping_names_do_not_share_files() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "nodejs-lts", 200, &["x.patch"]).await;
    mock_api(&server, "nodejs-lts", 200, &[]).await;
    mock_listing(&server, "nodejs", 200, &["lts-x.patch"]).await;
    mock_api(&server, "nodejs", 200, &[]).await;
    mock_raw(&server, "nodejs-lts", "x.patch").await;
    mock_raw(&server, "nodejs", "lts-x.patch").await;

    let temp = tempdir().unwrap();
    let (resolver, _rx) = build_resolver(&server, temp.path());
    let report = resolver
        .resolve(&sources(&["nodejs-lts", "nodejs"]), "master")
        .await
        .unwrap();

    assert_eq!(
        report.patch_set.labels(),
        vec!["nodejs-lts/x.patch", "nodejs/lts-x.patch"]
    );
    let patches: Vec<_> = report.patch_set.iter().collect();
    assert_ne!(patches[0].path, patches[1].path);
    for patch in patches {
        let contents = std::fs::read(&patch.path).unwrap();
        assert!(String::from_utf8_lossy(&contents).contains(&patch.file_name));
        assert_eq!(
            patch.digest.as_deref(),
            Some(blake3::hash(&contents).to_hex().as_str())
        );
    }
}

#[tokio::test]
async fn test_api_names_with_path_components_are_ignored() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 404, &[]).await;
    let raw = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("escaped");
            then.status(200).body("--- a/escaped\n");
        })
        .await;
    let body = format!(
        r#"[{{"name":"x/../../escaped.patch","type":"file","download_url":"{}"}}]"#,
        server.url("/raw/A/escaped.patch")
    );
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/A");
            then.status(200).body(body);
        })
        .await;

    let temp = tempdir().unwrap();
    let patch_dir = temp.path().join("patches");
    let (resolver, _rx) = build_resolver(&server, &patch_dir);
    let report = resolver.resolve(&sources(&["A"]), "master").await.unwrap();

    assert!(report.patch_set.is_empty());
    assert!(report.unreachable.is_empty());
    raw.assert_hits_async(0).await;
    assert!(!temp.path().join("escaped.patch").exists());
    assert!(!patch_dir.join("escaped.patch").exists());
}

/// Reports whatever names it was built with, bypassing suffix filtering
struct FixedNames(Vec<&'static str>);

#[async_trait]
impl DiscoveryStrategy for FixedNames {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ContentsApi
    }

    async fn list_patches(&self, source: &PatchSource) -> Result<Vec<PatchCandidate>, Error> {
        Ok(self
            .0
            .iter()
            .map(|name| PatchCandidate {
                source: source.id.clone(),
                file_name: (*name).to_string(),
                url: format!("http://127.0.0.1:9/{name}"),
                strategy: StrategyKind::ContentsApi,
            })
            .collect())
    }
}

#[tokio::test]
async fn test_unsafe_names_are_never_downloaded() {
    let temp = tempdir().unwrap();
    let patch_dir = temp.path().join("patches");
    let (tx, _rx) = channel();
    let resolver = PatchResolver::new(NetClient::with_defaults().unwrap(), &patch_dir, tx)
        .with_strategy(FixedNames(vec!["../escaped.patch"]));

    let report = resolver
        .resolve(&sources(&["A", "../outside"]), "master")
        .await
        .unwrap();

    assert!(report.patch_set.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file_name, "../escaped.patch");
    assert_eq!(report.unreachable, vec!["../outside"]);
    assert!(!temp.path().join("outside").exists());
    assert!(!patch_dir.join("escaped.patch").exists());
}

#[tokio::test]
async fn test_api_token_is_sent_as_bearer() {
    let server = MockServer::start_async().await;
    mock_listing(&server, "A", 404, &[]).await;
    let api = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/A")
                .header("authorization", "Bearer t0ken");
            then.status(200).body("[]");
        })
        .await;

    let temp = tempdir().unwrap();
    let (tx, _rx) = channel();
    let client = NetClient::with_defaults().unwrap();
    let resolver = PatchResolver::new(client.clone(), temp.path(), tx).with_strategy(
        ContentsApi::new(
            client,
            server.url("/api/{source}"),
            server.url("/raw/{source}/{file}"),
            vec![".patch".to_string()],
        )
        .with_token(Some("t0ken".to_string())),
    );

    let report = resolver.resolve(&sources(&["A"]), "master").await.unwrap();
    api.assert_async().await;
    assert!(report.unreachable.is_empty());
}
