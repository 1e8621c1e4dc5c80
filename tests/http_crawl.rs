use spider_images::{
    BatchStatus, BingImageSpider, CrawlerBuilder, Downloader, FetchErrorCause, KeywordOutcome,
    ReqwestClientDownloader,
};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(urls: &[String]) -> String {
    let tiles: String = urls
        .iter()
        .map(|url| {
            format!(
                r#"<li><a class="iusc" m='{{"cid":"c","murl":"{}","turl":"t"}}' href="/images/detail">x</a></li>"#,
                url.replace('/', "\\/")
            )
        })
        .collect();
    format!(
        "<!DOCTYPE html><html><body><ul>{}<li><a class=\"iusc\" m='{{\"turl\":\"t\"}}'>no murl</a></li></ul></body></html>",
        tiles
    )
}

fn spider_for(server: &MockServer) -> BingImageSpider {
    BingImageSpider::with_base_url(
        Url::parse(&format!("{}/images/search", server.uri())).unwrap(),
    )
}

async fn mount_image(server: &MockServer, at: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn crawls_search_page_and_saves_images_in_extraction_order() {
    let server = MockServer::start().await;
    let page = results_page(&[
        format!("{}/img/a.jpg", server.uri()),
        format!("{}/redirect/b.png", server.uri()),
        format!("{}/img/missing.gif", server.uri()),
        format!("{}/img/d.jpeg?w=300", server.uri()),
    ]);
    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(query_param("q", "Overwatch"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    mount_image(&server, "/img/a.jpg", b"jpeg bytes").await;
    mount_image(&server, "/img/b.png", b"png bytes").await;
    mount_image(&server, "/img/d.jpeg", b"jpeg too").await;
    Mock::given(method("GET"))
        .and(path("/redirect/b.png"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/img/b.png", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/missing.gif"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CrawlerBuilder::new(spider_for(&server))
        .destination_root(dir.path())
        .concurrency(2)
        .build()
        .unwrap();

    let report = crawler.run_batch(["Overwatch!"]).await;

    assert_eq!(report.status(), BatchStatus::Completed);
    assert_eq!(
        report.outcome_for("Overwatch!"),
        Some(&KeywordOutcome::Completed { saved: 3 })
    );
    assert_eq!(
        std::fs::read(dir.path().join("Overwatch_0.jpg")).unwrap(),
        b"jpeg bytes"
    );
    assert_eq!(
        std::fs::read(dir.path().join("Overwatch_1.png")).unwrap(),
        b"png bytes"
    );
    assert!(!dir.path().join("Overwatch_2.gif").exists());
    assert_eq!(
        std::fs::read(dir.path().join("Overwatch_3.jpeg")).unwrap(),
        b"jpeg too"
    );
}

#[tokio::test]
async fn search_page_error_fails_only_that_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(query_param("q", "broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(query_param("q", "Valornt 2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(&[format!("{}/img/v.jpg", server.uri())])),
        )
        .mount(&server)
        .await;
    mount_image(&server, "/img/v.jpg", b"v").await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CrawlerBuilder::new(spider_for(&server))
        .destination_root(dir.path())
        .concurrency(2)
        .build()
        .unwrap();

    let report = crawler.run_batch(["broken", "Valor@nt 2"]).await;

    assert!(report.is_completed());
    match report.outcome_for("broken") {
        Some(KeywordOutcome::Failed { reason }) => assert!(reason.contains("503"), "{}", reason),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        report.outcome_for("Valor@nt 2"),
        Some(&KeywordOutcome::Completed { saved: 1 })
    );
    let files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["Valornt 2_0.jpg".to_string()]);
}

#[tokio::test]
async fn downloader_classifies_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let downloader = ReqwestClientDownloader::with_settings(
        "spider-images-test",
        Duration::from_millis(200),
        5,
    )
    .unwrap();

    let err = downloader
        .fetch(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.cause, FetchErrorCause::Status(410));

    let err = downloader
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "{:?}", err);

    let err = downloader.fetch("not a url").await.unwrap_err();
    assert!(matches!(err.cause, FetchErrorCause::InvalidUrl(_)));

    let err = downloader.fetch("ftp://example.com/a.jpg").await.unwrap_err();
    assert!(matches!(err.cause, FetchErrorCause::InvalidUrl(_)));
}

#[tokio::test]
async fn downloader_follows_redirect_chains() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hop1"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/hop2", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hop2"))
        .respond_with(
            ResponseTemplate::new(307).insert_header("Location", format!("{}/final", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_image(&server, "/final", b"landed").await;

    let downloader = ReqwestClientDownloader::default();
    let body = downloader
        .fetch(&format!("{}/hop1", server.uri()))
        .await
        .unwrap();
    assert_eq!(&body[..], b"landed");

    let fetched = downloader
        .fetch_resolved(&format!("{}/hop1", server.uri()))
        .await
        .unwrap();
    assert_eq!(fetched.final_url, format!("{}/final", server.uri()));
    assert_eq!(&fetched.body[..], b"landed");
}

#[tokio::test]
async fn redirected_image_is_named_after_final_url() {
    let server = MockServer::start().await;
    let page = results_page(&[format!("{}/get?id=5", server.uri())]);
    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(query_param("q", "cats"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/cdn/x.png", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_image(&server, "/cdn/x.png", b"png after redirect").await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CrawlerBuilder::new(spider_for(&server))
        .destination_root(dir.path())
        .build()
        .unwrap();

    let report = crawler.run_batch(["cats"]).await;

    assert_eq!(
        report.outcome_for("cats"),
        Some(&KeywordOutcome::Completed { saved: 1 })
    );
    assert_eq!(
        std::fs::read(dir.path().join("cats_0.png")).unwrap(),
        b"png after redirect"
    );
    assert!(!dir.path().join("cats_0.get?").exists());
}
