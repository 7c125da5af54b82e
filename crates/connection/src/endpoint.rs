use {
    corelink_protocol::{BRIDGE_ID, TOKEN_QUERY_KEY, WS_PATH_SEGMENT},
    url::Url,
};

use crate::error::{Error, Result};

/// Build the socket URL for the engine.
///
/// One trailing `/` is stripped, `/ws/<bridge id>` is appended unless the
/// path already routes through `/ws/`, and a non-empty `token` is added to
/// the query unless one is already there.
pub fn derive_socket_url(raw: &str, token: &str) -> Result<Url> {
    let trimmed = raw.strip_suffix('/').unwrap_or(raw);
    let mut url = Url::parse(trimmed).map_err(|e| Error::invalid_url(raw, e))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(Error::invalid_url(
            raw,
            format!("unsupported scheme \"{}\"", url.scheme()),
        ));
    }

    if !url.path().contains(WS_PATH_SEGMENT) {
        let path = format!(
            "{}{WS_PATH_SEGMENT}{BRIDGE_ID}",
            url.path().trim_end_matches('/')
        );
        url.set_path(&path);
    }

    let has_token = url.query_pairs().any(|(key, _)| key == TOKEN_QUERY_KEY);
    if !token.is_empty() && !has_token {
        url.query_pairs_mut().append_pair(TOKEN_QUERY_KEY, token);
    }

    Ok(url)
}

/// The URL with any token value masked, for logs.
pub fn display_url(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == TOKEN_QUERY_KEY) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == TOKEN_QUERY_KEY {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
