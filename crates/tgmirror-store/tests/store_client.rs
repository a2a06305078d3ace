use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tgmirror_store::{parse_document, PostDocument, StoreClient, StoreConfig, StoreError};
use tgmirror_types::ExtractedPost;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILE_PATH: &str = "/files/content%2Ftgposts%2F42%2Findex.md";

fn client(server: &MockServer) -> StoreClient {
    let config = StoreConfig::new(format!("{}/files", server.uri()), "test-token");
    StoreClient::new(config).expect("client")
}

fn post() -> ExtractedPost {
    ExtractedPost {
        post_id: 42,
        title: "Release notes".to_string(),
        date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        edit_date: None,
        link: "https://t.me/chan/42".to_string(),
        media_html: None,
        body_html: "<div class=\"js-message_text\">Body</div>".to_string(),
        has_fallback_title: false,
    }
}

#[tokio::test]
async fn create_posts_document_with_bearer_token() {
    let server = MockServer::start().await;
    let document = PostDocument::assemble(&post()).unwrap();

    Mock::given(method("POST"))
        .and(path(FILE_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "branch": "master",
            "content": document.content,
            "commit_message": "Create new tgpost 42: [2024-03-01T12:00:00+00:00]: Release notes",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .create_or_update(42, &document, false)
        .await
        .expect("create ok");
}

#[tokio::test]
async fn update_puts_document() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let document = client(&server)
        .write_post(&post(), true)
        .await
        .expect("update ok");

    let (front_matter, body) = parse_document(&document.content).unwrap();
    assert_eq!(front_matter.post_id, 42);
    assert_eq!(body, post().body_html);
}

#[tokio::test]
async fn delete_sends_branch_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(FILE_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "branch": "master",
            "commit_message": "Delete tgpost 42",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete(42).await.expect("delete ok");
}

#[tokio::test]
async fn duplicate_create_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(FILE_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"message":"A file with this name already exists"}"#),
        )
        .mount(&server)
        .await;

    let document = PostDocument::assemble(&post()).unwrap();
    let err = client(&server)
        .create_or_update(42, &document, false)
        .await
        .unwrap_err();

    match &err {
        StoreError::Rejected {
            post_id,
            status,
            body,
        } => {
            assert_eq!(*post_id, 42);
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("already exists"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.post_id(), Some(42));
}

#[tokio::test]
async fn custom_branch_scopes_writes() {
    let server = MockServer::start().await;
    let mut config = StoreConfig::new(format!("{}/files", server.uri()), "test-token");
    config.branch = "main".to_string();

    Mock::given(method("DELETE"))
        .and(path(FILE_PATH))
        .and(body_json(json!({
            "branch": "main",
            "commit_message": "Delete tgpost 42",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    StoreClient::new(config)
        .unwrap()
        .delete(42)
        .await
        .expect("delete ok");
}
