use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tgmirror_extractor::{ExtractConfig, ExtractError, PostExtractor};
use tgmirror_types::{ChannelMessage, ForwardOrigin, MediaFlags};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMBED_PAGE: &str = r#"<html><body>
<div class="tgme_widget_message_bubble">
<a class="tgme_widget_message_photo_wrap" href="https://t.me/chan/5"></a>
<div class="tgme_widget_message_text js-message_text" dir="auto"><b>Launch</b> notes</div>
</div>
</body></html>"#;

fn extractor() -> PostExtractor {
    PostExtractor::new(&ExtractConfig::default()).expect("extractor")
}

#[tokio::test]
async fn extracts_post_from_embed_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chan/5"))
        .and(query_param("embed", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EMBED_PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let message = ChannelMessage::new(5, date)
        .with_text("Launch notes", "*Launch* notes")
        .with_link(format!("{}/chan/5", server.uri()))
        .with_media(MediaFlags {
            photo: true,
            ..MediaFlags::default()
        });

    let post = extractor().extract(&message).await.expect("extract ok");

    assert_eq!(post.post_id, 5);
    assert_eq!(post.title, "Launch");
    assert!(!post.has_fallback_title);
    assert_eq!(post.date, date);
    assert_eq!(post.edit_date, None);
    assert!(post.body_html.contains("<b>Launch</b> notes"));
    let media = post.media_html.expect("photo flag set");
    assert!(media.contains("tgme_widget_message_photo_wrap"));
}

#[tokio::test]
async fn forwarded_post_is_fetched_from_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chan/5"))
        .and(query_param("embed", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EMBED_PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let origin_date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let forward_date = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
    let message = ChannelMessage::new(77, forward_date)
        .with_text("Launch notes", "Launch notes")
        .with_link(format!("{}/mirror/77", server.uri()))
        .forwarded_from(ForwardOrigin {
            chat_link: Some(format!("{}/chan", server.uri())),
            message_id: 5,
            date: origin_date,
        });

    let post = extractor().extract(&message).await.expect("extract ok");

    assert_eq!(post.post_id, 5);
    assert_eq!(post.link, format!("{}/chan/5", server.uri()));
    assert_eq!(post.date, origin_date);
    assert_eq!(post.edit_date, Some(forward_date));
    assert_eq!(post.title, "Launch notes");
    assert!(post.has_fallback_title);
    assert_eq!(post.media_html, None);
}

#[tokio::test]
async fn embed_status_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chan/9"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let message = ChannelMessage::new(9, Utc::now())
        .with_text("x", "x")
        .with_link(format!("{}/chan/9", server.uri()));

    let err = extractor().extract(&message).await.unwrap_err();
    match &err {
        ExtractError::HttpStatus { status, .. } => assert_eq!(status.as_u16(), 502),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn embed_timeout_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chan/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(1500))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let config = ExtractConfig {
        request_timeout: 1,
        ..ExtractConfig::default()
    };
    let extractor = PostExtractor::new(&config).expect("extractor");
    let message = ChannelMessage::new(1, Utc::now())
        .with_text("x", "x")
        .with_link(format!("{}/chan/slow", server.uri()));

    let err = extractor.extract(&message).await.unwrap_err();
    assert!(matches!(err, ExtractError::Fetch { .. }));
    assert!(err.is_retryable());
}
