use vapor_guard::KeyFormatError;

use crate::parser::ParseError;

/// Failures surfaced by the protocol client. Errors are returned to the
/// caller unmodified; nothing in this crate retries or recovers.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("malformed secret: {0}")]
    KeyFormat(#[from] KeyFormatError),
    #[error("transport failure: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {status}")]
    Transport { status: u16 },
    #[error("protocol violation: {0}")]
    Protocol(&'static str),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("password encryption failed: {0}")]
    Rsa(#[from] rsa::Error),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("no shared secret was supplied")]
    MissingSharedSecret,
    #[error("no identity secret was supplied")]
    MissingIdentitySecret,
    #[error("two-factor code required or wrong")]
    TwoFactorRequired,
    #[error("captcha required, gid {captcha_gid}")]
    CaptchaRequired { captcha_gid: String },
    #[error("login denied: {message}")]
    LoginDenied { message: String },
}
