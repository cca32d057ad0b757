//! Client address used to key the login and article-creation budgets.
//!
//! `X-Forwarded-For` and `X-Real-IP` are believed only when the socket peer
//! is listed in `server.trusted_proxies`. With the default empty list the
//! headers are ignored, so a client cannot mint a fresh budget per request,
//! but behind a reverse proxy every visitor then shares the proxy's budget.
//! Listing the proxy restores per-visitor keys; the client address is the
//! nearest `X-Forwarded-For` hop that is not itself a listed proxy. `*`
//! believes any peer and takes the first hop, which lets anyone who can reach
//! the listener directly pick their own key.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::config::TrustedProxies;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
    Arc<TrustedProxies>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trusted = Arc::<TrustedProxies>::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self(resolve(&parts.headers, peer, &trusted)))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trusted: &TrustedProxies) -> String {
    let peer_ip = peer.map(|addr| addr.ip());

    if trusted.trusts(peer_ip) {
        if let Some(forwarded) = header_value(headers, FORWARDED_FOR) {
            let hops: Vec<&str> = forwarded
                .split(',')
                .map(str::trim)
                .filter(|hop| !hop.is_empty())
                .collect();
            let client = match trusted {
                TrustedProxies::List(_) => hops
                    .iter()
                    .rev()
                    .find(|hop| !trusted.trusts(hop.parse::<IpAddr>().ok()))
                    .or(hops.first()),
                _ => hops.first(),
            };
            if let Some(client) = client {
                return (*client).to_string();
            }
        }
        if let Some(real) = header_value(headers, REAL_IP) {
            return real.to_string();
        }
    }

    peer_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
