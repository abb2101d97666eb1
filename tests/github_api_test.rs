//! Wire-level tests for the GitHub backend against a mock server.

use octocrab::Octocrab;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use semflow::error::VcsError;
use semflow::vcs::{GitHub, HostOptions, StagedChange, VcsHost};

fn host_options() -> HostOptions {
    HostOptions {
        project: "octo".to_string(),
        repo: "app".to_string(),
        ..HostOptions::default()
    }
}

fn github_client(server: &MockServer) -> GitHub {
    // The default retry policy re-sends 5xx-answered requests, which would
    // break the exact `.expect(n)` counts on the error-path mocks.
    let octocrab = Octocrab::builder()
        .base_uri(server.uri())
        .expect("octocrab base uri")
        .add_retry_config(octocrab::service::middleware::retry::RetryConfig::None)
        .build()
        .expect("octocrab client");
    GitHub::with_client(octocrab, &host_options())
}

/// GitHub-shaped 404 so the client maps it to "object does not exist".
fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "message": "Not Found",
        "documentation_url": "https://docs.github.com/rest",
    }))
}

/// Complete-enough pull request object: octocrab's `PullRequest` model also
/// demands `url`, `head`, and `base` (each with mandatory `ref` + `sha`).
fn pr_json(number: u64, title: &str) -> serde_json::Value {
    json!({
        "id": number,
        "number": number,
        "title": title,
        "state": "open",
        "url": format!("https://api.github.com/repos/octo/app/pulls/{number}"),
        "head": { "ref": "semflow--master", "sha": "head-sha" },
        "base": { "ref": "master", "sha": "base-sha" },
    })
}

#[tokio::test]
async fn test_last_ref_returns_the_branch_tip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/git/ref/heads/master"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "head-sha" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let sha = host.last_ref("master").await.expect("last ref");

    assert_eq!(sha.as_deref(), Some("head-sha"));
}

#[tokio::test]
async fn test_last_ref_is_none_for_a_missing_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/git/ref/heads/semflow--master"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let sha = host.last_ref("semflow--master").await.expect("last ref");

    assert_eq!(sha, None);
}

#[tokio::test]
async fn test_last_ref_only_maps_a_404_to_a_missing_branch() {
    let server = MockServer::start().await;
    // The status decides, not the error text.
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/git/ref/heads/master"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "message": "Upstream said: Not Found",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let err = host.last_ref("master").await.expect_err("api error");

    assert!(matches!(err, VcsError::GitHubApi(_)));
}

#[tokio::test]
async fn test_update_ref_force_moves_an_existing_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/git/ref/heads/semflow--master"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "old-sha" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/app/git/refs/heads/semflow--master"))
        .and(body_partial_json(json!({ "sha": "new-sha", "force": true })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "new-sha" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let sha = host
        .update_ref("semflow--master", "new-sha", "old-sha")
        .await
        .expect("update ref");

    assert_eq!(sha, "new-sha");
}

#[tokio::test]
async fn test_update_ref_creates_a_missing_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/git/ref/heads/semflow--master"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/app/git/refs"))
        .and(body_partial_json(
            json!({ "ref": "refs/heads/semflow--master", "sha": "new-sha" }),
        ))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "object": { "sha": "new-sha" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let sha = host
        .update_ref("semflow--master", "new-sha", "")
        .await
        .expect("update ref");

    assert_eq!(sha, "new-sha");
}

#[tokio::test]
async fn test_push_commit_chains_tree_commit_and_ref() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/git/commits/head-sha"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "tree": { "sha": "base-tree-sha" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/app/git/trees"))
        .and(body_partial_json(json!({
            "base_tree": "base-tree-sha",
            "tree": [{
                "path": "CHANGELOG.md",
                "mode": "100644",
                "type": "blob",
                "content": "\n## 1.1.0\n",
            }],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree-sha" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/app/git/commits"))
        .and(body_partial_json(json!({
            "message": "chore(release): 1.1.0",
            "tree": "tree-sha",
            "parents": ["head-sha"],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "commit-sha" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/app/git/refs/heads/semflow--master"))
        .and(body_partial_json(json!({ "sha": "commit-sha", "force": true })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "commit-sha" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let changes = vec![StagedChange {
        path: "CHANGELOG.md".to_string(),
        content: "\n## 1.1.0\n".to_string(),
    }];
    host.push_commit("semflow--master", "head-sha", "chore(release): 1.1.0", &changes)
        .await
        .expect("push commit");
}

#[tokio::test]
async fn test_find_pr_returns_the_first_open_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/pulls"))
        .and(query_param("state", "open"))
        .and(query_param("head", "*:semflow--master"))
        .and(query_param("base", "master"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([pr_json(7, "chore(release): 1.1.0")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let pr = host.find_pr("master", "semflow--master").await.expect("find pr");

    assert_eq!(pr, Some(7));
}

#[tokio::test]
async fn test_find_pr_is_none_without_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let pr = host.find_pr("master", "semflow--master").await.expect("find pr");

    assert_eq!(pr, None);
}

#[tokio::test]
async fn test_create_pr_returns_the_new_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/app/pulls"))
        .and(body_partial_json(json!({
            "title": "chore(release): 1.1.0",
            "head": "semflow--master",
            "base": "master",
            "body": "\n## 1.1.0\n",
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(pr_json(42, "chore(release): 1.1.0")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let id = host
        .create_pr("master", "semflow--master", "chore(release): 1.1.0", "\n## 1.1.0\n")
        .await
        .expect("create pr");

    assert_eq!(id, 42);
}

#[tokio::test]
async fn test_update_pr_returns_the_number() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/app/pulls/42"))
        .and(body_partial_json(json!({
            "title": "chore(release): 1.2.0",
            "body": "updated notes",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "number": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let id = host
        .update_pr(42, "chore(release): 1.2.0", "updated notes")
        .await
        .expect("update pr");

    assert_eq!(id, 42);
}

#[tokio::test]
async fn test_last_commit_returns_sha_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/commits/refs/heads/master"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc123",
            "commit": { "message": "chore(release): 1.2.3" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let (sha, message) = host.last_commit("master").await.expect("last commit");

    assert_eq!(sha, "abc123");
    assert_eq!(message, "chore(release): 1.2.3");
}

#[tokio::test]
async fn test_create_annotated_tag_writes_object_and_ref() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/app/git/tags"))
        .and(body_partial_json(json!({
            "tag": "1.2.3",
            "message": "1.2.3",
            "object": "abc123",
            "type": "commit",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tag-obj-sha" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/app/git/refs"))
        .and(body_partial_json(
            json!({ "ref": "refs/tags/1.2.3", "sha": "abc123" }),
        ))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "object": { "sha": "abc123" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    host.create_annotated_tag("abc123", "1.2.3").await.expect("create tag");
}

#[tokio::test]
async fn test_pr_title_reads_the_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/pulls/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(pr_json(7, "feat: [JIRA-1] a linted title")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let title = host.pr_title(7).await.expect("pr title");

    assert_eq!(title, "feat: [JIRA-1] a linted title");
}

#[tokio::test]
async fn test_server_errors_surface_as_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/commits/refs/heads/master"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Server Error",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let host = github_client(&server);
    let err = host.last_commit("master").await.expect_err("server error");

    assert!(matches!(err, VcsError::GitHubApi(_)));
}
