use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use tracing::debug;

use vapor_guard::{confirmation_key, Clock, IdentitySecret, SystemClock};

use crate::endpoints::{
    AJAX_REQUESTER, COMMUNITY_BASE_URL, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_PLATFORM,
    MOBILECONF_DETAILS_PATH, MOBILECONF_LIST_PATH, MOBILECONF_OP_PATH, MOBILE_APP_REQUESTER,
};
use crate::error::ClientError;
use crate::parser::{ConfirmationListing, ListingParser, MobileConfParser};
use crate::session::Session;

const LIST_TAG: &str = "conf";

/// Action taken on a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationAction {
    Allow,
    Cancel,
}

impl ConfirmationAction {
    /// Wire tag of the action; also the tag signed into its key.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Cancel => "cancel",
        }
    }
}

/// Client for the mobile confirmation endpoints. Each operation reads the
/// clock at call time, derives a fresh confirmation key and issues exactly
/// one request; instances hold no mutable state and are shareable across
/// tasks.
pub struct ConfirmationClient {
    http: reqwest::Client,
    base_url: String,
    identity_secret: IdentitySecret,
    device_id: String,
    session: Session,
    platform: String,
    accept_language: String,
    clock: Arc<dyn Clock>,
    parser: Box<dyn ListingParser>,
}

impl std::fmt::Debug for ConfirmationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationClient")
            .field("base_url", &self.base_url)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl ConfirmationClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        identity_secret: IdentitySecret,
        device_id: impl Into<String>,
        session: Session,
    ) -> Self {
        Self {
            http,
            base_url: COMMUNITY_BASE_URL.to_string(),
            identity_secret,
            device_id: device_id.into(),
            session,
            platform: DEFAULT_PLATFORM.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            clock: Arc::new(SystemClock),
            parser: Box::new(MobileConfParser),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Box<dyn ListingParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Fetches the pending confirmation listing.
    pub async fn fetch(&self) -> Result<ConfirmationListing, ClientError> {
        let timestamp = self.clock.now_unix();
        let key = confirmation_key(&self.identity_secret, timestamp, LIST_TAG);
        let t = timestamp.to_string();
        let url = self.endpoint(MOBILECONF_LIST_PATH);

        let mut request = self
            .http
            .get(&url)
            .query(&[
                ("p", self.device_id.as_str()),
                ("a", self.session.account_id.as_str()),
                ("k", key.as_str()),
                ("t", t.as_str()),
                ("m", self.platform.as_str()),
                ("tag", LIST_TAG),
            ])
            .header("X-Requested-With", MOBILE_APP_REQUESTER)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str());
        if let Some(cookie) = self.session.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        debug!(method = "GET", url = %url, tag = LIST_TAG, "confirmation request");
        let start = Instant::now();
        let response = request.send().await?;
        debug!(
            method = "GET",
            url = %url,
            status = %response.status(),
            elapsed_ms = start.elapsed().as_millis(),
            "confirmation response"
        );
        ensure_status_ok(&response)?;
        let body = response.text().await?;
        Ok(self.parser.parse_listing(&body)?)
    }

    /// Accepts or cancels a single confirmation. `confirmation_signing_key`
    /// is the server nonce taken from the listing entry. Returns the
    /// service's verdict verbatim.
    pub async fn act(
        &self,
        confirmation_id: &str,
        confirmation_signing_key: &str,
        action: ConfirmationAction,
    ) -> Result<bool, ClientError> {
        let timestamp = self.clock.now_unix();
        let tag = action.as_tag();
        let key = confirmation_key(&self.identity_secret, timestamp, tag);
        let t = timestamp.to_string();
        let url = self.endpoint(MOBILECONF_OP_PATH);

        let mut request = self
            .http
            .post(&url)
            .query(&[
                ("op", tag),
                ("tag", tag),
                ("p", self.device_id.as_str()),
                ("a", self.session.account_id.as_str()),
                ("k", key.as_str()),
                ("t", t.as_str()),
                ("m", self.platform.as_str()),
                ("cid", confirmation_id),
                ("ck", confirmation_signing_key),
            ])
            .header("X-Requested-With", AJAX_REQUESTER);
        if let Some(cookie) = self.session.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        debug!(method = "POST", url = %url, tag, cid = confirmation_id, "confirmation request");
        let start = Instant::now();
        let response = request.send().await?;
        debug!(
            method = "POST",
            url = %url,
            status = %response.status(),
            elapsed_ms = start.elapsed().as_millis(),
            "confirmation response"
        );
        ensure_status_ok(&response)?;
        let body = response.text().await?;
        let verdict: serde_json::Value = serde_json::from_str(&body)
            .map_err(|_| ClientError::Protocol("confirmation verdict is not json"))?;
        verdict
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .ok_or(ClientError::Protocol(
                "confirmation verdict is missing boolean `success`",
            ))
    }

    /// Fetches the detail payload of one confirmation; the JSON body is
    /// returned verbatim.
    pub async fn details(&self, confirmation_id: &str) -> Result<serde_json::Value, ClientError> {
        let timestamp = self.clock.now_unix();
        let tag = format!("details{confirmation_id}");
        let key = confirmation_key(&self.identity_secret, timestamp, &tag);
        let t = timestamp.to_string();
        let url = format!(
            "{}/{confirmation_id}",
            self.endpoint(MOBILECONF_DETAILS_PATH)
        );

        let mut request = self
            .http
            .get(&url)
            .query(&[
                ("tag", tag.as_str()),
                ("p", self.device_id.as_str()),
                ("a", self.session.account_id.as_str()),
                ("k", key.as_str()),
                ("t", t.as_str()),
                ("m", self.platform.as_str()),
            ])
            .header("X-Requested-With", MOBILE_APP_REQUESTER)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str());
        if let Some(cookie) = self.session.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        debug!(method = "GET", url = %url, tag = %tag, "confirmation request");
        let start = Instant::now();
        let response = request.send().await?;
        debug!(
            method = "GET",
            url = %url,
            status = %response.status(),
            elapsed_ms = start.elapsed().as_millis(),
            "confirmation response"
        );
        ensure_status_ok(&response)?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|_| ClientError::Protocol("confirmation details are not json"))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn ensure_status_ok(response: &reqwest::Response) -> Result<(), ClientError> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        Ok(())
    } else {
        Err(ClientError::Transport {
            status: status.as_u16(),
        })
    }
}
