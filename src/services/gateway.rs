// src/services/gateway.rs

//! Session/Auth gateway.
//!
//! Owns the authenticated HTTP session with the portal and hands out decoded
//! page text. The session is a single mutable resource meant for sequential
//! use; authentication state is an explicit field, never ambient.

use async_trait::async_trait;
use encoding_rs::Encoding;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::{AuthConfig, PortalConfig};
use crate::utils::http;

/// Anything that can turn a URL into page text.
///
/// The extraction pipeline depends on this seam rather than on the HTTP
/// session, so saved pages and fixtures can stand in for the portal.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `url` and return its decoded text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Authenticated HTTP session with the timetable portal.
pub struct PortalSession {
    client: Client,
    config: PortalConfig,
    encoding: &'static Encoding,
    authenticated: bool,
}

impl PortalSession {
    /// Create an unauthenticated session.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_client(config)?,
            config: config.clone(),
            encoding: http::encoding_for(&config.encoding)?,
            authenticated: false,
        })
    }

    /// Whether a login has succeeded on this session.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Log in with the given credentials.
    ///
    /// On rejection the session stays unauthenticated and the caller gets
    /// [`AppError::AuthRejected`]; nothing panics.
    pub async fn authenticate(&mut self, auth: &AuthConfig) -> Result<()> {
        self.authenticated = false;
        let login_url = self.config.login_url();
        log::debug!("Logging in at {login_url} as {}", auth.login);

        let response = self
            .client
            .post(&login_url)
            .form(&[("login", auth.login.as_str()), ("password", auth.password.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = http::decode_body(&response.bytes().await?, self.encoding);

        check_login_response(status, &body, &self.config.failure_phrase)?;
        self.authenticated = true;
        log::info!("Authenticated as {}", auth.login);
        Ok(())
    }
}

#[async_trait]
impl PageSource for PortalSession {
    async fn fetch(&self, url: &str) -> Result<String> {
        if self.config.require_auth && !self.authenticated {
            return Err(AppError::NotAuthenticated);
        }

        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, status));
        }

        let bytes = response.bytes().await.map_err(|e| AppError::fetch(url, e))?;
        Ok(http::decode_body(&bytes, self.encoding))
    }
}

/// Decide whether a login response means success.
fn check_login_response(status: StatusCode, body: &str, failure_phrase: &str) -> Result<()> {
    if !status.is_success() {
        return Err(AppError::AuthRejected(format!("login returned {status}")));
    }
    if !failure_phrase.is_empty() && body.contains(failure_phrase) {
        return Err(AppError::AuthRejected("invalid login or password".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use encoding_rs::WINDOWS_1251;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const PHRASE: &str = "Неверный логин или пароль";

    #[test]
    fn test_login_accepted() {
        assert!(check_login_response(StatusCode::OK, "<html>Добро пожаловать</html>", PHRASE).is_ok());
    }

    #[test]
    fn test_login_rejected_by_phrase() {
        let result = check_login_response(StatusCode::OK, "<p>Неверный логин или пароль</p>", PHRASE);
        assert!(matches!(result, Err(AppError::AuthRejected(_))));
    }

    #[test]
    fn test_login_rejected_by_status() {
        let result = check_login_response(StatusCode::FORBIDDEN, "", PHRASE);
        assert!(matches!(result, Err(AppError::AuthRejected(_))));
    }

    #[tokio::test]
    async fn test_fetch_requires_login() {
        let session = PortalSession::new(&PortalConfig::default()).unwrap();
        assert!(!session.is_authenticated());

        let result = session.fetch("https://lk.ulstu.ru/timetable/x.html").await;
        assert!(matches!(result, Err(AppError::NotAuthenticated)));
    }

    const PAGE_TEXT: &str = "<p>Неделя: 5-я</p>";

    fn open_config() -> PortalConfig {
        PortalConfig {
            require_auth: false,
            ..PortalConfig::default()
        }
    }

    /// Serve `/page` as a windows-1251 body labelled UTF-8; anything else is 404.
    async fn spawn_portal() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);

                let (status, body) = if request.starts_with("GET /page ") {
                    ("200 OK", WINDOWS_1251.encode(PAGE_TEXT).0.into_owned())
                } else {
                    ("404 Not Found", b"missing".to_vec())
                };
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_fetch_decodes_forced_encoding() {
        let addr = spawn_portal().await;
        let session = PortalSession::new(&open_config()).unwrap();

        let text = session.fetch(&format!("http://{addr}/page")).await.unwrap();
        assert_eq!(text, PAGE_TEXT);
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_fetch_failure() {
        let addr = spawn_portal().await;
        let session = PortalSession::new(&open_config()).unwrap();

        let url = format!("http://{addr}/missing");
        let result = session.fetch(&url).await;
        match result {
            Err(AppError::FetchFailed { url: failed, reason }) => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("expected FetchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_transport_error_is_fetch_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session = PortalSession::new(&open_config()).unwrap();
        let result = session.fetch(&format!("http://{addr}/page")).await;
        assert!(matches!(result, Err(AppError::FetchFailed { .. })));
        assert!(result.unwrap_err().is_fetch_failure());
    }
}
