use std::sync::Arc;

use serde::Deserialize;

use vapor_guard::{derive_device_id, guard_code, Clock, IdentitySecret, SharedSecret, SystemClock};

use crate::confirmations::ConfirmationClient;
use crate::endpoints::COMMUNITY_BASE_URL;
use crate::error::ClientError;
use crate::login::{login, Credentials, LoginPrompts};
use crate::session::Session;

/// Authenticator material as stored in a credential file. Secrets are
/// validated while deserializing; fields absent from the file stay `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MobileCredentials {
    pub shared_secret: Option<SharedSecret>,
    pub identity_secret: Option<IdentitySecret>,
    pub device_id: Option<String>,
}

/// Facade tying an account, its authenticator material and the protocol
/// operations together. Login yields the session; the confirmation client
/// exists only after a successful login with an identity secret present.
pub struct Authenticator {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    shared_secret: Option<SharedSecret>,
    identity_secret: Option<IdentitySecret>,
    device_id: String,
    clock: Arc<dyn Clock>,
    session: Option<Session>,
    confirmations: Option<ConfirmationClient>,
}

impl Authenticator {
    /// A missing device id is derived deterministically from the account
    /// name, so one account always presents the same device.
    #[must_use]
    pub fn new(http: reqwest::Client, credentials: Credentials, mobile: MobileCredentials) -> Self {
        let device_id = mobile
            .device_id
            .unwrap_or_else(|| derive_device_id(&credentials.username));
        Self {
            http,
            base_url: COMMUNITY_BASE_URL.to_string(),
            credentials,
            shared_secret: mobile.shared_secret,
            identity_secret: mobile.identity_secret,
            device_id,
            clock: Arc::new(SystemClock),
            session: None,
            confirmations: None,
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
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Current guard code for the account's shared secret.
    pub fn guard_code(&self) -> Result<String, ClientError> {
        let secret = self
            .shared_secret
            .as_ref()
            .ok_or(ClientError::MissingSharedSecret)?;
        Ok(guard_code(secret, self.clock.now_unix()))
    }

    /// Runs the login handshake. When the account has a shared secret and
    /// the prompts carry no explicit code, a fresh guard code is injected.
    pub async fn login(&mut self, prompts: LoginPrompts) -> Result<(), ClientError> {
        let mut prompts = prompts;
        if prompts.guard_code.is_none() {
            if let Some(secret) = self.shared_secret.as_ref() {
                prompts.guard_code = Some(guard_code(secret, self.clock.now_unix()));
            }
        }
        let session = login(
            &self.http,
            &self.base_url,
            &self.credentials,
            &prompts,
            self.clock.as_ref(),
        )
        .await?;
        self.confirmations = self.identity_secret.as_ref().map(|secret| {
            ConfirmationClient::new(
                self.http.clone(),
                secret.clone(),
                self.device_id.clone(),
                session.clone(),
            )
            .with_base_url(self.base_url.clone())
            .with_clock(Arc::clone(&self.clock))
        });
        self.session = Some(session);
        Ok(())
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Confirmation operations for the logged-in session. Requires a
    /// successful login and an identity secret.
    pub fn confirmations(&self) -> Result<&ConfirmationClient, ClientError> {
        if self.session.is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        self.confirmations
            .as_ref()
            .ok_or(ClientError::MissingIdentitySecret)
    }
}
