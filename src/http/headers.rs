//! Header handling between client and upstream.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop headers the upstream client recomputes (Host, Content-Length)
//! - Drop Accept-Encoding so the upstream client negotiates gzip itself
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host

use std::net::SocketAddr;

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue,
};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("proxy-connection");
}

/// Build the header map sent upstream from the inbound headers.
pub fn upstream_request_headers(inbound: &HeaderMap, client_addr: Option<SocketAddr>) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::ACCEPT_ENCODING);

    if let Some(addr) = client_addr {
        let forwarded_for = match inbound
            .get(&X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
        {
            Some(prior) => format!("{}, {}", prior, addr.ip()),
            None => addr.ip().to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    if let Some(host) = inbound.get(header::HOST) {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }

    headers
}

/// Headers returned to the client from an upstream response.
pub fn client_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_hop_by_hop(&mut headers);
    headers
}

/// Relabel a `Content-Type` whose body was re-encoded as UTF-8.
///
/// Returns `None` when the value has no `charset` parameter or already says
/// UTF-8, in which case the header is correct as it is.
pub fn utf8_content_type(value: &HeaderValue) -> Option<HeaderValue> {
    let value = value.to_str().ok()?;
    let mut params: Vec<String> = value.split(';').map(|p| p.trim().to_string()).collect();

    let charset = params.iter_mut().skip(1).find(|param| {
        param
            .split_once('=')
            .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
    })?;
    let current = charset.split_once('=').map(|(_, v)| v.trim().trim_matches('"'))?;
    if current.eq_ignore_ascii_case("utf-8") || current.eq_ignore_ascii_case("utf8") {
        return None;
    }
    *charset = "charset=utf-8".to_string();

    HeaderValue::from_str(&params.join("; ")).ok()
}
