pub mod fetcher;
pub mod proxy;

pub use fetcher::Fetcher;
pub use proxy::ProxyRotator;

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use sitecrawler_core::FetchConfig;

    use crate::{Fetcher, ProxyRotator};

    #[tokio::test]
    async fn fetches_mock_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let proxy = Arc::new(ProxyRotator::new(Vec::new(), Duration::from_secs(3600), String::new()));
        let fetcher = Fetcher::new(FetchConfig::default(), 3, Duration::from_millis(1), proxy);

        let url = format!("{}/page", server.uri());
        let resp = fetcher.fetch(&url).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"hello");
    }

    #[tokio::test]
    async fn retries_on_server_error_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let proxy = Arc::new(ProxyRotator::new(Vec::new(), Duration::from_secs(3600), String::new()));
        let fetcher = Fetcher::new(FetchConfig::default(), 3, Duration::from_millis(1), proxy);

        let url = format!("{}/flaky", server.uri());
        let resp = fetcher.fetch(&url).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn retries_on_non_404_client_error_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let proxy = Arc::new(ProxyRotator::new(Vec::new(), Duration::from_secs(3600), String::new()));
        let fetcher = Fetcher::new(FetchConfig::default(), 3, Duration::from_millis(1), proxy);

        let url = format!("{}/throttled", server.uri());
        let resp = fetcher.fetch(&url).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn terminal_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let proxy = Arc::new(ProxyRotator::new(Vec::new(), Duration::from_secs(3600), String::new()));
        let fetcher = Fetcher::new(FetchConfig::default(), 3, Duration::from_millis(1), proxy);

        let url = format!("{}/missing", server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
