//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the listing, commits, and
//! project page endpoints and run the full checkpoint loop end-to-end.

use gitlab_harvest::config::Config;
use gitlab_harvest::crawler::Harvester;
use gitlab_harvest::state::{Cursor, WindowKey};
use gitlab_harvest::storage::{JsonStorage, Storage};
use gitlab_harvest::HarvestError;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const LISTING_PATH: &str = "/api/v4/projects";

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, work_dir: &Path, start_id: Option<i64>) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api/v4", server.uri());
    config.crawler.concurrency = 2;
    config.crawler.cooldown_secs = 0;
    config.crawler.max_pages = 3;
    config.crawler.request_timeout_secs = 5;
    config.output.work_dir = work_dir.display().to_string();
    config.window.start_id = start_id;
    config
}

fn read_json(path: &Path) -> Vec<Value> {
    let content = std::fs::read_to_string(path).expect("window file missing");
    serde_json::from_str(&content).expect("window file is not a JSON array")
}

/// Mounts a listing page for one cursor; more specific than `mount_empty_listing`
async fn mount_listing_page(server: &MockServer, id_before: &str, page: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("id_before", id_before))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Every listing page not mounted otherwise is past the end of the listing
async fn mount_empty_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Writes all three artifacts of a window, as an earlier harvest would
async fn save_complete_window(storage: &mut JsonStorage, key: WindowKey, id: i64) {
    storage.save_projects(&key, &[json!({"id": id})]).await.unwrap();
    storage.save_commits(&key, &[]).await.unwrap();
    storage.save_meta(&key, &[]).await.unwrap();
}

fn listing_cursors(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter(|request| request.url.path() == LISTING_PATH)
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "id_before")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

#[tokio::test]
async fn test_full_harvest_from_start_cursor() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    mount_listing_page(
        &server,
        "1000",
        "1",
        json!([
            {"id": 995, "name": "older", "web_url": format!("{}/group/older", server.uri())},
            {"id": 998, "name": "newer", "web_url": format!("{}/group/newer", server.uri())}
        ]),
    )
    .await;
    mount_empty_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/998/repository/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c0ffee", "title": "Initial commit"},
            {"id": "beef00", "title": "Add README"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/995/repository/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/newer"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                 <div class="project-buttons gl-mb-3 js-show-on-project-root">
                   <a href="/group/newer/-/blob/main/README.md">README</a>
                   <a href="/group/newer/-/blob/main/LICENSE">MIT License</a>
                 </div>
               </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/group/older"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                 <div class="home-panel-home-desc mt-1">
                   <p>Mirrored from GitHub</p>
                   <p>Pull mirror of https://github.com/example/older</p>
                 </div>
               </body></html>"#,
        ))
        .mount(&server)
        .await;

    let config = create_test_config(&server, work_dir.path(), Some(1000));
    let mut harvester = Harvester::new(config, false).await.unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.windows, 1);
    assert_eq!(summary.projects, 2);
    assert_eq!(summary.commits, 2);
    assert_eq!(summary.metas, 2);
    assert_eq!(summary.final_cursor, Cursor::before(995));
    assert!(summary.finished_at.is_some());

    let projects = read_json(&work_dir.path().join("projects/1000_995_project.json"));
    let ids: Vec<_> = projects.iter().map(|p| p["id"].as_i64()).collect();
    assert_eq!(ids, vec![Some(998), Some(995)]);

    let commits = read_json(&work_dir.path().join("commits/1000_995_project_commits.json"));
    assert_eq!(commits.len(), 2);
    assert!(commits.iter().all(|c| c["project_id"] == 998));

    let mut metas = read_json(&work_dir.path().join("meta/1000_995_project_meta.json"));
    metas.sort_by_key(|m| m["project_id"].as_i64());
    assert_eq!(
        metas,
        vec![
            json!({
                "project_id": 995,
                "project_license": null,
                "project_mirrored": "pull mirror of https://github.com/example/older"
            }),
            json!({
                "project_id": 998,
                "project_license": "MIT License",
                "project_mirrored": null
            }),
        ]
    );

    // The second window asked below the first one's floor, then stopped
    let requests = server.received_requests().await.unwrap();
    let cursors = listing_cursors(&requests);
    assert_eq!(cursors.len(), 6);
    assert!(cursors[..3].iter().all(|c| c == "1000"));
    assert!(cursors[3..].iter().all(|c| c == "995"));
}

#[tokio::test]
async fn test_cursor_decreases_across_windows() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    mount_listing_page(&server, "", "1", json!([{"id": 900}, {"id": 850}])).await;
    mount_listing_page(&server, "850", "2", json!([{"id": 700}])).await;
    mount_listing_page(&server, "700", "1", json!([{"id": 120}, {"id": 300}])).await;
    mount_empty_listing(&server).await;

    let config = create_test_config(&server, work_dir.path(), None);
    let mut harvester = Harvester::new(config, false).await.unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.windows, 3);
    assert_eq!(summary.final_cursor, Cursor::before(120));

    let storage = JsonStorage::new(work_dir.path());
    assert_eq!(
        storage.list_windows().await.unwrap(),
        vec![
            WindowKey::new(Cursor::unset(), 850),
            WindowKey::new(Cursor::before(850), 700),
            WindowKey::new(Cursor::before(700), 120),
        ]
    );

    // Within a window every page shares one cursor; across windows it only drops
    let requests = server.received_requests().await.unwrap();
    let cursors: Vec<Option<i64>> = listing_cursors(&requests)
        .iter()
        .map(|c| c.parse().ok())
        .collect();
    assert_eq!(cursors.len(), 12);
    for window in cursors.chunks(3) {
        assert!(window.iter().all(|c| *c == window[0]));
    }
    assert_eq!(cursors[0], None);
    assert!(cursors[3..]
        .windows(2)
        .all(|pair| pair[1].unwrap() <= pair[0].unwrap()));
}

#[tokio::test]
async fn test_undecodable_page_is_dropped() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("id_before", "1000"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_listing_page(&server, "1000", "2", json!([{"id": 500, "name": "kept"}])).await;
    mount_empty_listing(&server).await;

    let config = create_test_config(&server, work_dir.path(), Some(1000));
    let mut harvester = Harvester::new(config, false).await.unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.windows, 1);
    assert_eq!(summary.projects, 1);
    // Commits are unmocked (404) and the project has no page URL
    assert_eq!(summary.commits, 0);
    assert_eq!(summary.metas, 1);

    let metas = read_json(&work_dir.path().join("meta/1000_500_project_meta.json"));
    assert_eq!(
        metas,
        vec![json!({"project_id": 500, "project_license": null, "project_mirrored": null})]
    );
    assert!(read_json(&work_dir.path().join("commits/1000_500_project_commits.json")).is_empty());
}

#[tokio::test]
async fn test_resume_from_checkpoint() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    let mut storage = JsonStorage::new(work_dir.path());
    let done = WindowKey::new(Cursor::before(1000), 700);
    save_complete_window(&mut storage, done, 700).await;

    mount_empty_listing(&server).await;

    let config = create_test_config(&server, work_dir.path(), Some(1000));
    let mut harvester = Harvester::new(config, true).await.unwrap();
    assert_eq!(harvester.cursor(), Cursor::before(700));

    let summary = harvester.run().await.unwrap();
    assert_eq!(summary.windows, 0);
    assert_eq!(summary.final_cursor, Cursor::before(700));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(listing_cursors(&requests), vec!["700", "700", "700"]);
}

#[tokio::test]
async fn test_start_id_ignores_windows_on_disk() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    // A previous harvest with another date range left this window behind
    let mut storage = JsonStorage::new(work_dir.path());
    save_complete_window(&mut storage, WindowKey::new(Cursor::before(1000), 640), 640).await;

    mount_listing_page(&server, "50000", "1", json!([{"id": 49000}])).await;
    mount_empty_listing(&server).await;

    let mut config = create_test_config(&server, work_dir.path(), Some(50000));
    config.window.since = Some("2021-01-01".to_string());
    let mut harvester = Harvester::new(config, false).await.unwrap();
    assert_eq!(harvester.cursor(), Cursor::before(50000));

    let summary = harvester.run().await.unwrap();
    assert_eq!(summary.windows, 1);
    assert_eq!(summary.final_cursor, Cursor::before(49000));

    let requests = server.received_requests().await.unwrap();
    let cursors = listing_cursors(&requests);
    assert_eq!(cursors[..3], ["50000", "50000", "50000"]);
    assert!(requests
        .iter()
        .filter(|request| request.url.path() == LISTING_PATH)
        .all(|request| request
            .url
            .query_pairs()
            .any(|(key, value)| key == "last_activity_after" && value == "2021-01-01")));
    assert!(work_dir
        .path()
        .join("projects/50000_49000_project.json")
        .is_file());
}

#[tokio::test]
async fn test_listing_without_ids_stalls() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    mount_listing_page(&server, "1000", "1", json!([{"name": "no id"}])).await;
    mount_empty_listing(&server).await;

    let config = create_test_config(&server, work_dir.path(), Some(1000));
    let mut harvester = Harvester::new(config, false).await.unwrap();
    let err = harvester.run().await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::CursorStalled { count: 1, .. }
    ));
    assert!(!work_dir.path().join("projects").exists());
}

#[tokio::test]
async fn test_date_window_bounds_listing_and_commits() {
    let server = MockServer::start().await;
    let work_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("id_before", "1000"))
        .and(query_param("page", "1"))
        .and(query_param("last_activity_after", "2020-01-01"))
        .and(query_param("last_activity_before", "2020-02-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_empty_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/repository/commits"))
        .and(query_param("since", "2020-01-01"))
        .and(query_param("until", "2020-02-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "abc"}])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, work_dir.path(), Some(1000));
    config.window.since = Some("2020-01-01".to_string());
    config.window.until = Some("2020-02-01".to_string());

    let mut harvester = Harvester::new(config, false).await.unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.windows, 1);
    assert_eq!(summary.commits, 1);
}
