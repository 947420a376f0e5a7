/// An authenticated web session: the account id from the login transfer
/// parameters plus the cookies the login response set. Validity is the
/// caller's concern; nothing here refreshes or persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: String,
    pub cookies: Vec<(String, String)>,
}

impl Session {
    #[must_use]
    pub fn new(account_id: impl Into<String>, cookies: Vec<(String, String)>) -> Self {
        Self {
            account_id: account_id.into(),
            cookies,
        }
    }

    /// Renders the cookie set as a `Cookie` header value, or `None` when
    /// the session carries no cookies.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
