//! Test doubles shared by the step definitions

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use aro_watch::error::TransportError;
use aro_watch::io::{BasicAuth, HttpClient, HttpResponse, Mailer, OutgoingMail};
use aro_watch::notifier::Channel;
use aro_watch::WatchError;
use tokio::sync::{Mutex, RwLock};

/// Markup for a page that lists the ARO unit with the given status text
pub fn listing_page(name: &str, status: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <div class="hero">Lincoln Common</div>
            <div class="floorplan-card">
                <h3>{name}</h3>
                <span>{status}</span>
                <span>{price}</span>
            </div>
        </body></html>"#
    )
}

/// A card whose title and status sit in separate child elements
pub fn card_page(title: &str, status: &str) -> String {
    format!(
        r#"<html><body>
            <div class="floorplan-card">
                <div class="plan-name">{title}</div>
                <div class="status">{status}</div>
                <div class="price">$1,250</div>
            </div>
        </body></html>"#
    )
}

pub fn page_without_listing() -> String {
    r#"<html><body><div class="hero">Our new website is coming soon</div></body></html>"#
        .to_string()
}

/// One scripted answer to a GET
#[derive(Debug, Clone)]
pub enum Scripted {
    Page(String),
    Timeout,
    Status(u16),
}

impl Scripted {
    /// Parse a token like "available", "missing", "timeout" or "status 503"
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "available" => Scripted::Page(listing_page("1 BR ARO", "Available Now", "$1,250")),
            "unavailable" => Scripted::Page(listing_page("1 BR ARO", "Waitlist", "$1,250")),
            "missing" => Scripted::Page(page_without_listing()),
            "timeout" => Scripted::Timeout,
            other => match other.strip_prefix("status ") {
                Some(code) => Scripted::Status(code.parse().expect("status code")),
                None => panic!("Unknown page script: {}", other),
            },
        }
    }
}

/// A recorded form POST
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// Serves scripted pages for GETs and records POSTs
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    pub pages: Mutex<VecDeque<Scripted>>,
    pub gets: RwLock<Vec<String>>,
    pub posts: RwLock<Vec<RecordedPost>>,
    pub reject_posts: AtomicBool,
}

impl ScriptedHttpClient {
    pub async fn script(&self, tokens: &str) {
        let mut pages = self.pages.lock().await;
        pages.extend(tokens.split(',').map(Scripted::parse));
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str) -> aro_watch::Result<HttpResponse> {
        self.gets.write().await.push(url.to_string());
        match self.pages.lock().await.pop_front() {
            Some(Scripted::Page(body)) => Ok(HttpResponse { status: 200, body }),
            Some(Scripted::Status(status)) => Ok(HttpResponse {
                status,
                body: "Service Unavailable".to_string(),
            }),
            Some(Scripted::Timeout) => {
                Err(TransportError::Timeout(format!("GET {}: deadline elapsed", url)).into())
            }
            None => Err(TransportError::Network("no scripted response left".to_string()).into()),
        }
    }

    async fn post_form(
        &self,
        url: &str,
        _auth: &BasicAuth,
        params: &[(&str, &str)],
    ) -> aro_watch::Result<HttpResponse> {
        self.posts.write().await.push(RecordedPost {
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        if self.reject_posts.load(Ordering::SeqCst) {
            Ok(HttpResponse {
                status: 400,
                body: r#"{"code":21211,"message":"Invalid 'To' Phone Number"}"#.to_string(),
            })
        } else {
            Ok(HttpResponse {
                status: 201,
                body: r#"{"sid":"SM00000000000000000000000000000000"}"#.to_string(),
            })
        }
    }
}

/// Records mail instead of talking SMTP
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: RwLock<Vec<OutgoingMail>>,
    pub reject: AtomicBool,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> aro_watch::Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(WatchError::notification(
                Channel::Email,
                "535 authentication failed",
            ));
        }
        self.sent.write().await.push(mail.clone());
        Ok(())
    }
}
