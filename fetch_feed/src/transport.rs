use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{FeedError, Result};

pub type Query = Vec<(String, String)>;

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Performs a GET against the feed and hands back the raw body.
///
/// Implementations are shared between concurrent calls and must stop work
/// with [`FeedError::Cancelled`] once `cancel` fires.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: Query, cancel: CancellationToken) -> Result<Vec<u8>>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, path: &str, query: Query) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let body = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: Query, cancel: CancellationToken) -> Result<Vec<u8>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FeedError::Cancelled),
            body = self.fetch(path, query) => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;

    use super::*;

    fn token_query(token: &str) -> Query {
        vec![("token".to_string(), token.to_string())]
    }

    #[tokio::test]
    async fn get_when_server_answers_then_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/feed/istanbul/")
            .match_query(Matcher::UrlEncoded("token".into(), "abc".into()))
            .match_header("user-agent", USER_AGENT)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;
        let transport = HttpTransport::new(&server.url()).unwrap();

        let body = transport
            .get("/feed/istanbul/", token_query("abc"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(body, br#"{"status":"ok"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_when_geo_path_then_keeps_separators() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/feed/geo:41.014722;28.954722/")
            .match_query(Matcher::UrlEncoded("token".into(), "abc".into()))
            .with_body("{}")
            .create_async()
            .await;
        let base_url = format!("{}/", server.url());
        let transport = HttpTransport::new(&base_url).unwrap();

        let body = transport
            .get(
                "/feed/geo:41.014722;28.954722/",
                token_query("abc"),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(body, b"{}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_when_server_fails_then_returns_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/feed/here/")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;
        let transport = HttpTransport::new(&server.url()).unwrap();

        let err = transport
            .get("/feed/here/", token_query("abc"), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Http(502)));
    }

    #[tokio::test]
    async fn get_when_cancelled_then_does_not_send() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let transport = HttpTransport::new(&server.url()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = transport
            .get("/feed/here/", token_query("abc"), cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Cancelled));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_when_cancelled_while_server_stalls_then_returns_promptly() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted_tx, accepted_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let _ = accepted_tx.send(());
            // Hold the connection open without ever answering.
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });
        let transport = HttpTransport::new(&format!("http://{}", addr)).unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            let _ = accepted_rx.await;
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            transport.get("/feed/here/", token_query("abc"), cancel),
        )
        .await
        .expect("cancellation did not interrupt the request");

        assert!(matches!(result, Err(FeedError::Cancelled)));
    }

    #[tokio::test]
    async fn get_when_host_unreachable_then_returns_transport_error() {
        let transport = HttpTransport::new("http://127.0.0.1:1").unwrap();

        let err = transport
            .get("/feed/here/", token_query("abc"), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Transport(_)));
    }
}
