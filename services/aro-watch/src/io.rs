//! HTTP and SMTP abstractions for testability

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::TransportError;
use crate::notifier::Channel;
use crate::WatchError;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP basic auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with form-encoded body and basic auth
    async fn post_form(
        &self,
        url: &str,
        auth: &BasicAuth,
        params: &[(&str, &str)],
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> crate::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Config(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn transport_error(method: &str, url: &str, e: reqwest::Error) -> WatchError {
    if e.is_timeout() {
        TransportError::Timeout(format!("{} {}: {}", method, url, e)).into()
    } else {
        TransportError::Network(format!("{} {} failed: {}", method, url, e)).into()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error("GET", url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("GET", url, e))?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_form(
        &self,
        url: &str,
        auth: &BasicAuth,
        params: &[(&str, &str)],
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .basic_auth(&auth.username, Some(&auth.password))
            .form(params)
            .send()
            .await
            .map_err(|e| transport_error("POST", url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("POST", url, e))?;

        tracing::debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// A plain-text e-mail ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Abstraction over the SMTP transport
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> crate::Result<()>;
}

/// SMTP mailer using STARTTLS and login credentials
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> crate::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| {
                WatchError::notification(Channel::Email, format!("SMTP relay {}: {}", host, e))
            })?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self { transport })
    }
}

fn mailbox(address: &str) -> crate::Result<Mailbox> {
    address.parse::<Mailbox>().map_err(|e| {
        WatchError::notification(Channel::Email, format!("Invalid address '{}': {}", address, e))
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> crate::Result<()> {
        let message = Message::builder()
            .from(mailbox(&mail.from)?)
            .to(mailbox(&mail.to)?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| WatchError::notification(Channel::Email, e.to_string()))?;

        tracing::debug!("SMTP send to {}", mail.to);
        self.transport
            .send(message)
            .await
            .map_err(|e| WatchError::notification(Channel::Email, e.to_string()))?;
        Ok(())
    }
}
