use std::fmt;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use reqwest::header::{HeaderMap, COOKIE, REFERER, SET_COOKIE};
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPublicKey};
use serde::Deserialize;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use vapor_guard::Clock;

use crate::endpoints::{
    DO_LOGIN_PATH, MOBILE_APP_REQUESTER, MOBILE_LOGIN_COOKIES, MOBILE_LOGIN_REFERER,
    RSA_CHALLENGE_PATH,
};
use crate::error::ClientError;
use crate::session::Session;

/// Account credentials. The password never appears in logs or `Debug`
/// output and is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"REDACTED")
            .finish()
    }
}

/// Optional second-factor inputs for one login attempt.
#[derive(Debug, Clone, Default)]
pub struct LoginPrompts {
    pub guard_code: Option<String>,
    pub email_code: Option<String>,
    pub captcha: Option<Captcha>,
}

#[derive(Debug, Clone)]
pub struct Captcha {
    pub gid: String,
    pub text: String,
}

/// RSA parameters the service issues for a single password encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaChallenge {
    pub modulus_hex: String,
    pub exponent_hex: String,
    /// Opaque challenge timestamp, echoed back as `rsatimestamp`.
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
struct RsaChallengeBody {
    #[serde(default)]
    success: bool,
    publickey_mod: Option<String>,
    publickey_exp: Option<String>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    requires_twofactor: bool,
    #[serde(default)]
    captcha_needed: bool,
    captcha_gid: Option<serde_json::Value>,
    message: Option<String>,
    transfer_parameters: Option<TransferParameters>,
}

#[derive(Debug, Deserialize)]
struct TransferParameters {
    steamid: Option<String>,
}

/// Requests the RSA parameters under which the password must be encrypted.
pub async fn fetch_rsa_challenge(
    http: &reqwest::Client,
    base_url: &str,
    username: &str,
    clock: &dyn Clock,
) -> Result<RsaChallenge, ClientError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), RSA_CHALLENGE_PATH);
    let donotcache = (clock.now_unix() * 1000).to_string();
    let form = [
        ("donotcache", donotcache.as_str()),
        ("username", username),
    ];

    debug!(method = "POST", url = %url, "rsa challenge request");
    let start = Instant::now();
    let response = http
        .post(&url)
        .form(&form)
        .header("X-Requested-With", MOBILE_APP_REQUESTER)
        .header(REFERER, MOBILE_LOGIN_REFERER)
        .header(COOKIE, MOBILE_LOGIN_COOKIES)
        .send()
        .await?;
    debug!(
        method = "POST",
        url = %url,
        status = %response.status(),
        elapsed_ms = start.elapsed().as_millis(),
        "rsa challenge response"
    );
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(ClientError::Transport {
            status: status.as_u16(),
        });
    }
    let body = response.text().await?;
    let body: RsaChallengeBody = serde_json::from_str(&body)
        .map_err(|_| ClientError::Protocol("rsa challenge is not json"))?;
    if !body.success {
        return Err(ClientError::Protocol("rsa challenge was refused"));
    }
    match (body.publickey_mod, body.publickey_exp, body.timestamp) {
        (Some(modulus_hex), Some(exponent_hex), Some(timestamp)) => Ok(RsaChallenge {
            modulus_hex,
            exponent_hex,
            timestamp,
        }),
        _ => Err(ClientError::Protocol(
            "rsa challenge is missing the public key",
        )),
    }
}

/// Encrypts the password under the challenge key, PKCS#1 v1.5, base64
/// output as the login form expects.
pub fn encrypt_password(challenge: &RsaChallenge, password: &str) -> Result<String, ClientError> {
    let modulus = BigUint::parse_bytes(challenge.modulus_hex.as_bytes(), 16)
        .ok_or(ClientError::Protocol("rsa modulus is not hex"))?;
    let exponent = BigUint::parse_bytes(challenge.exponent_hex.as_bytes(), 16)
        .ok_or(ClientError::Protocol("rsa exponent is not hex"))?;
    let key = RsaPublicKey::new(modulus, exponent)?;
    let ciphertext = key.encrypt(&mut OsRng, Pkcs1v15Encrypt, password.as_bytes())?;
    Ok(STANDARD.encode(ciphertext))
}

/// One-shot login handshake: challenge fetch, password encryption and the
/// credential post. Yields the session on success; refusals map to the
/// matching `ClientError` variant. The session is never persisted here.
pub async fn login(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
    prompts: &LoginPrompts,
    clock: &dyn Clock,
) -> Result<Session, ClientError> {
    let challenge = fetch_rsa_challenge(http, base_url, &credentials.username, clock).await?;
    let password = encrypt_password(&challenge, &credentials.password)?;

    let donotcache = (clock.now_unix() * 1000).to_string();
    let mut form: Vec<(&str, &str)> = vec![
        ("donotcache", donotcache.as_str()),
        ("username", credentials.username.as_str()),
        ("password", password.as_str()),
        ("rsatimestamp", challenge.timestamp.as_str()),
        ("remember_login", "true"),
    ];
    if let Some(code) = prompts.guard_code.as_deref() {
        form.push(("twofactorcode", code));
    }
    if let Some(code) = prompts.email_code.as_deref() {
        form.push(("emailauth", code));
    }
    if let Some(captcha) = prompts.captcha.as_ref() {
        form.push(("captchagid", captcha.gid.as_str()));
        form.push(("captcha_text", captcha.text.as_str()));
    }

    let url = format!("{}{}", base_url.trim_end_matches('/'), DO_LOGIN_PATH);
    debug!(method = "POST", url = %url, username = %credentials.username, "login request");
    let start = Instant::now();
    let response = http
        .post(&url)
        .form(&form)
        .header("X-Requested-With", MOBILE_APP_REQUESTER)
        .header(REFERER, MOBILE_LOGIN_REFERER)
        .header(COOKIE, MOBILE_LOGIN_COOKIES)
        .send()
        .await?;
    debug!(
        method = "POST",
        url = %url,
        status = %response.status(),
        elapsed_ms = start.elapsed().as_millis(),
        "login response"
    );
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(ClientError::Transport {
            status: status.as_u16(),
        });
    }

    let cookies = harvest_cookies(response.headers());
    let body = response.text().await?;
    let body: LoginBody = serde_json::from_str(&body)
        .map_err(|_| ClientError::Protocol("login response is not json"))?;

    if !body.success {
        if body.requires_twofactor {
            return Err(ClientError::TwoFactorRequired);
        }
        if body.captcha_needed {
            return Err(ClientError::CaptchaRequired {
                captcha_gid: body.captcha_gid.map(render_gid).unwrap_or_default(),
            });
        }
        return Err(ClientError::LoginDenied {
            message: body.message.unwrap_or_default(),
        });
    }

    let account_id = body
        .transfer_parameters
        .and_then(|params| params.steamid)
        .ok_or(ClientError::Protocol(
            "login response is missing transfer parameters",
        ))?;
    Ok(Session::new(account_id, cookies))
}

fn harvest_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|header| header.split(';').next()?.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn render_gid(gid: serde_json::Value) -> String {
    match gid {
        serde_json::Value::String(gid) => gid,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use vapor_guard::FixedClock;

    const FIXED_TIME: u64 = 1_700_000_000;
    const TEST_MODULUS_HEX: &str = "b6d0d8d87f8ecde8827d24de854d98eb452110505bd77c081da19f0faad13733c37f48eaf9ae7816fa8e33c886ef93ec6a708345a75ebf57a30df8a5d4001455b62b117cb60306bb4e84b46c13a7ca2bdcfb2f8b58445625ede9b024e0cbc5b07310a382e98e397567d3d47f12abaf7876f89f6ffa25e977a83d627e14b44231";

    fn challenge() -> RsaChallenge {
        RsaChallenge {
            modulus_hex: TEST_MODULUS_HEX.to_string(),
            exponent_hex: "010001".to_string(),
            timestamp: "216000".to_string(),
        }
    }

    async fn mount_challenge(server: &mut Server) {
        server
            .mock("POST", "/login/getrsakey/")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "publickey_mod": TEST_MODULUS_HEX,
                    "publickey_exp": "010001",
                    "timestamp": "216000",
                })
                .to_string(),
            )
            .create_async()
            .await;
    }

    #[test]
    fn debug_redacts_the_password() {
        let rendered = format!("{:?}", Credentials::new("hydra", "hunter2"));
        assert!(rendered.contains("hydra"));
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn encrypt_password_fills_the_modulus_width() {
        let first = encrypt_password(&challenge(), "hunter2").expect("encrypt");
        let second = encrypt_password(&challenge(), "hunter2").expect("encrypt");
        let ciphertext = STANDARD.decode(&first).expect("base64");
        assert_eq!(ciphertext.len(), 128);
        // Randomized padding: equal inputs must not produce equal output.
        assert_ne!(first, second);
    }

    #[test]
    fn encrypt_password_rejects_bad_modulus() {
        let mut bad = challenge();
        bad.modulus_hex = "not hex".to_string();
        let err = encrypt_password(&bad, "hunter2").expect_err("must fail");
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn gid_renders_strings_and_numbers() {
        assert_eq!(render_gid(json!("3983452")), "3983452");
        assert_eq!(render_gid(json!(-1)), "-1");
    }

    #[tokio::test]
    async fn challenge_fetch_returns_the_public_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/login/getrsakey/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("donotcache".into(), "1700000000000".into()),
                Matcher::UrlEncoded("username".into(), "hydra".into()),
            ]))
            .match_header("x-requested-with", MOBILE_APP_REQUESTER)
            .match_header("cookie", MOBILE_LOGIN_COOKIES)
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "publickey_mod": TEST_MODULUS_HEX,
                    "publickey_exp": "010001",
                    "timestamp": "216000",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let fetched =
            fetch_rsa_challenge(&reqwest::Client::new(), &server.url(), "hydra", &clock)
                .await
                .expect("challenge");
        assert_eq!(fetched, challenge());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refused_challenge_is_a_protocol_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/login/getrsakey/")
            .with_status(200)
            .with_body(json!({ "success": false }).to_string())
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let err = fetch_rsa_challenge(&reqwest::Client::new(), &server.url(), "hydra", &clock)
            .await
            .expect_err("must fail");
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn login_builds_the_session_from_transfer_parameters() {
        let mut server = Server::new_async().await;
        mount_challenge(&mut server).await;
        let mock = server
            .mock("POST", "/login/dologin/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "hydra".into()),
                Matcher::UrlEncoded("rsatimestamp".into(), "216000".into()),
                Matcher::UrlEncoded("remember_login".into(), "true".into()),
                Matcher::UrlEncoded("twofactorcode".into(), "R2345".into()),
            ]))
            .match_header("cookie", MOBILE_LOGIN_COOKIES)
            .with_status(200)
            .with_header(
                "set-cookie",
                "steamLoginSecure=76561198045421446%7C%7Ctoken; Path=/; Secure; HttpOnly",
            )
            .with_header("set-cookie", "sessionid=abc123; Path=/")
            .with_body(
                json!({
                    "success": true,
                    "transfer_parameters": { "steamid": "76561198045421446" },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let prompts = LoginPrompts {
            guard_code: Some("R2345".to_string()),
            ..LoginPrompts::default()
        };
        let session = login(
            &reqwest::Client::new(),
            &server.url(),
            &Credentials::new("hydra", "hunter2"),
            &prompts,
            &clock,
        )
        .await
        .expect("login ok");

        assert_eq!(session.account_id, "76561198045421446");
        assert_eq!(
            session.cookies,
            vec![
                (
                    "steamLoginSecure".to_string(),
                    "76561198045421446%7C%7Ctoken".to_string()
                ),
                ("sessionid".to_string(), "abc123".to_string()),
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn two_factor_refusal_is_typed() {
        let mut server = Server::new_async().await;
        mount_challenge(&mut server).await;
        server
            .mock("POST", "/login/dologin/")
            .with_status(200)
            .with_body(
                json!({ "success": false, "requires_twofactor": true }).to_string(),
            )
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let err = login(
            &reqwest::Client::new(),
            &server.url(),
            &Credentials::new("hydra", "hunter2"),
            &LoginPrompts::default(),
            &clock,
        )
        .await
        .expect_err("must fail");
        assert!(matches!(err, ClientError::TwoFactorRequired));
    }

    #[tokio::test]
    async fn captcha_refusal_carries_the_gid() {
        let mut server = Server::new_async().await;
        mount_challenge(&mut server).await;
        server
            .mock("POST", "/login/dologin/")
            .with_status(200)
            .with_body(
                json!({
                    "success": false,
                    "captcha_needed": true,
                    "captcha_gid": "3983452198",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let err = login(
            &reqwest::Client::new(),
            &server.url(),
            &Credentials::new("hydra", "hunter2"),
            &LoginPrompts::default(),
            &clock,
        )
        .await
        .expect_err("must fail");
        match err {
            ClientError::CaptchaRequired { captcha_gid } => {
                assert_eq!(captcha_gid, "3983452198");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn denied_login_carries_the_message() {
        let mut server = Server::new_async().await;
        mount_challenge(&mut server).await;
        server
            .mock("POST", "/login/dologin/")
            .with_status(200)
            .with_body(
                json!({
                    "success": false,
                    "message": "The account name or password that you have entered is incorrect.",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let err = login(
            &reqwest::Client::new(),
            &server.url(),
            &Credentials::new("hydra", "wrong"),
            &LoginPrompts::default(),
            &clock,
        )
        .await
        .expect_err("must fail");
        match err {
            ClientError::LoginDenied { message } => {
                assert!(message.contains("incorrect"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_transfer_parameters_is_a_protocol_error() {
        let mut server = Server::new_async().await;
        mount_challenge(&mut server).await;
        server
            .mock("POST", "/login/dologin/")
            .with_status(200)
            .with_body(json!({ "success": true }).to_string())
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let err = login(
            &reqwest::Client::new(),
            &server.url(),
            &Credentials::new("hydra", "hunter2"),
            &LoginPrompts::default(),
            &clock,
        )
        .await
        .expect_err("must fail");
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn non_200_login_is_a_transport_error() {
        let mut server = Server::new_async().await;
        mount_challenge(&mut server).await;
        server
            .mock("POST", "/login/dologin/")
            .with_status(429)
            .create_async()
            .await;

        let clock = FixedClock(FIXED_TIME);
        let err = login(
            &reqwest::Client::new(),
            &server.url(),
            &Credentials::new("hydra", "hunter2"),
            &LoginPrompts::default(),
            &clock,
        )
        .await
        .expect_err("must fail");
        assert!(matches!(err, ClientError::Transport { status: 429 }));
    }
}
