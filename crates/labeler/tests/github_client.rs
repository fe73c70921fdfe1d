//! Integration tests for the GitHub REST client against a mock API server.

use base64::Engine;
use labeler::checks::{StatusCheck, StatusState};
use labeler::{GitHubClient, GitHubError, LabelHost, SignalSource};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(Some("t0k".to_string()), "acme", "app")
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
}

#[tokio::test]
async fn test_add_labels_is_one_batched_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/app/issues/7/labels"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_json(json!({ "labels": ["docs", "feat"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .add_labels(7, &["docs".to_string(), "feat".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_labels_surfaces_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/app/issues/7/labels"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "message": "Resource not accessible by integration" })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .add_labels(7, &["docs".to_string()])
        .await
        .unwrap_err();
    match err {
        GitHubError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Resource not accessible by integration");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_remove_missing_label_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/app/issues/7/labels/docs"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Label does not exist" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).remove_label(7, "docs").await.unwrap();
}

#[tokio::test]
async fn test_remove_label_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/acme/app/issues/7/labels/docs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).remove_label(7, "docs").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_create_status_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/app/statuses/abc123"))
        .and(body_json(json!({
            "state": "failure",
            "context": "Release Label",
            "description": "Missing label",
            "target_url": "https://example.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let check = StatusCheck {
        context: "Release Label".into(),
        state: StatusState::Failure,
        description: Some("Missing label".into()),
        target_url: Some("https://example.com".into()),
    };
    client(&server).create_status("abc123", &check).await.unwrap();
}

#[tokio::test]
async fn test_changed_files_follow_pagination() {
    let server = MockServer::start().await;
    let first_page: Vec<_> = (0..100)
        .map(|i| json!({ "filename": format!("src/file_{i}.rs") }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/acme/app/pulls/9/files"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/app/pulls/9/files"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "filename": "docs/readme.md" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let files = client(&server).changed_files(9).await.unwrap();
    assert_eq!(files.len(), 101);
    assert_eq!(files[0], "src/file_0.rs");
    assert_eq!(files[100], "docs/readme.md");
}

#[tokio::test]
async fn test_comment_bodies_and_commit_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/app/issues/9/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "body": "first" },
            { "body": null },
            { "body": "/docs" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/app/pulls/9/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "sha": "1", "commit": { "message": "feat: one" } },
            { "sha": "2", "commit": { "message": "fix: two" } }
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.comment_bodies(9).await.unwrap(), vec!["first", "/docs"]);
    assert_eq!(
        client.commit_messages(9).await.unwrap(),
        vec!["feat: one", "fix: two"]
    );
}

#[tokio::test]
async fn test_file_contents_decoding() {
    let server = MockServer::start().await;
    let yaml = "labels:\n  - label: docs\n";
    let encoded = base64::engine::general_purpose::STANDARD.encode(yaml);
    // The contents API wraps base64 at 60 columns
    let wrapped = format!("{}\n{}", &encoded[..10], &encoded[10..]);

    Mock::given(method("GET"))
        .and(path("/repos/acme/shared/contents/.github/labeler.yml"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "encoding": "base64",
            "content": wrapped
        })))
        .expect(1)
        .mount(&server)
        .await;

    let contents = client(&server)
        .get_file_contents("acme", "shared", ".github/labeler.yml", Some("main"))
        .await
        .unwrap();
    assert_eq!(contents, yaml);
}

#[tokio::test]
async fn test_exhausted_rate_limit() {
    let server = MockServer::start().await;
    let reset = chrono::Utc::now().timestamp() + 120;
    Mock::given(method("POST"))
        .and(path("/repos/acme/app/issues/7/labels"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str())
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.add_labels(7, &["docs".to_string()]).await.unwrap_err();
    assert!(matches!(err, GitHubError::RateLimited { .. }));

    // The next call is refused locally without reaching the server
    let err = client.add_labels(7, &["docs".to_string()]).await.unwrap_err();
    assert!(matches!(err, GitHubError::RateLimited { .. }));
}
