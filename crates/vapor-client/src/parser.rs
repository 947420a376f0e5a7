use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::instrument;

/// Message reported when a listing document has neither confirmation
/// entries nor the empty-state marker. An unrecognized document is
/// reported, not raised; the service's markup is not under our control.
pub const UNPARSABLE_DOCUMENT: &str = "unparsable document";

static LIST_ENTRY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.mobileconf_list_entry").expect("static selector"));

static EMPTY_MARKER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#mobileconf_empty").expect("static selector"));

static ENTRY_ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("static selector"));

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("confirmation entry is missing attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("confirmation entry has no icon")]
    MissingIcon,
}

/// One pending confirmation as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationRecord {
    /// Numeric confirmation type, verbatim from the markup.
    pub kind: String,
    pub confirmation_id: String,
    /// Server-issued nonce required to act on this confirmation. Unrelated
    /// to the HMAC confirmation key.
    pub confirmation_signing_key: String,
    pub creator_id: String,
    pub accept_label: String,
    pub cancel_label: String,
    pub icon_reference: String,
    /// Every non-empty text node under the entry, trimmed and
    /// newline-joined in document order.
    pub description: String,
}

/// Outcome of parsing a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfirmationListing {
    Pending(Vec<ConfirmationRecord>),
    Empty { message: String },
}

impl ConfirmationListing {
    #[must_use]
    pub fn has_confirmations(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Seam over the listing parser so degraded documents can be exercised
/// deterministically in tests.
pub trait ListingParser: Send + Sync {
    fn parse_listing(&self, html: &str) -> Result<ConfirmationListing, ParseError>;
}

/// Production parser over the mobileconf markup. Tolerant of malformed
/// HTML: truncated or unclosed tags are recovered, and only a structurally
/// incomplete entry (missing attribute or icon) is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MobileConfParser;

impl ListingParser for MobileConfParser {
    #[instrument(level = "debug", skip(self, html), fields(html_len = html.len()))]
    fn parse_listing(&self, html: &str) -> Result<ConfirmationListing, ParseError> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        for entry in document.select(&LIST_ENTRY) {
            records.push(parse_entry(entry)?);
        }
        if !records.is_empty() {
            return Ok(ConfirmationListing::Pending(records));
        }
        match document.select(&EMPTY_MARKER).next() {
            Some(marker) => Ok(ConfirmationListing::Empty {
                message: stripped_text(marker),
            }),
            None => Ok(ConfirmationListing::Empty {
                message: UNPARSABLE_DOCUMENT.to_string(),
            }),
        }
    }
}

fn parse_entry(entry: ElementRef<'_>) -> Result<ConfirmationRecord, ParseError> {
    let icon = entry
        .select(&ENTRY_ICON)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or(ParseError::MissingIcon)?;
    Ok(ConfirmationRecord {
        kind: required_attr(entry, "data-type")?,
        confirmation_id: required_attr(entry, "data-confid")?,
        confirmation_signing_key: required_attr(entry, "data-key")?,
        creator_id: required_attr(entry, "data-creator")?,
        accept_label: required_attr(entry, "data-accept")?,
        cancel_label: required_attr(entry, "data-cancel")?,
        icon_reference: icon.to_string(),
        description: stripped_text(entry),
    })
}

fn required_attr(entry: ElementRef<'_>, name: &'static str) -> Result<String, ParseError> {
    entry
        .value()
        .attr(name)
        .map(str::to_string)
        .ok_or(ParseError::MissingAttribute(name))
}

fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
