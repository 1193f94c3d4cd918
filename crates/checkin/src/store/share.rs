//! Shareable link tokens.
//!
//! A token is the link list serialized as a JSON array, base64-encoded with
//! the standard alphabet and then percent-encoded so it can sit in a query
//! string untouched.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use crate::error::{Error, Result};

/// Encode `links` into a URL-safe token.
///
/// # Errors
///
/// Returns an error if the list cannot be serialized.
pub fn encode_links<'a, I>(links: I) -> Result<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let links: Vec<&String> = links.into_iter().collect();
    let json = serde_json::to_string(&links)?;
    let encoded = STANDARD.encode(json.as_bytes());
    Ok(urlencoding::encode(&encoded).into_owned())
}

/// Decode a token back into the ordered link list.
///
/// Accepts the token either still percent-encoded or already decoded by a
/// query-string parser.
///
/// # Errors
///
/// Returns [`Error::Decode`] if any layer of the token is malformed.
pub fn decode_links(token: &str) -> Result<Vec<String>> {
    let unescaped = urlencoding::decode(token)
        .map_err(|e| Error::decode(format!("invalid percent-encoding: {e}")))?;
    let bytes = STANDARD
        .decode(unescaped.trim().as_bytes())
        .map_err(|e| Error::decode(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::decode(format!("invalid link list: {e}")))
}

/// Build the shareable address for `links`.
///
/// Any query or fragment already on `base` is dropped. Returns `None` when
/// there are no links to share.
///
/// # Errors
///
/// Returns an error if the list cannot be serialized.
pub fn share_url<'a, I>(base: &Url, param: &str, links: I) -> Result<Option<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut links = links.into_iter().peekable();
    if links.peek().is_none() {
        return Ok(None);
    }
    let token = encode_links(links)?;

    let mut address = base.clone();
    address.set_query(None);
    address.set_fragment(None);
    Ok(Some(format!("{address}?{param}={token}")))
}

/// Extract the raw share token carried by `url`, if any.
#[must_use]
pub fn token_from_url(url: &Url, param: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, value)| key == param && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
