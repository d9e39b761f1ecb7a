// src/geo.rs
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::NOT_AVAILABLE;

const PRIVATE_RANGES: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Outcome of a country lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Country {
    Named(String),
    /// Missing address or one inside a private range; no lookup made.
    Private,
    /// Transport error, timeout, bad status or bad body.
    Unavailable,
    /// Service answered but had no country.
    Unknown,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Country::Named(name) => f.write_str(name),
            Country::Private => f.write_str("Internal/Private IP"),
            Country::Unavailable => f.write_str("API Error/Offline"),
            Country::Unknown => f.write_str(NOT_AVAILABLE),
        }
    }
}

#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// Never fails; errors collapse into a sentinel.
    async fn country(&self, ip: Option<&str>) -> Country;
}

/// True for an address inside one of the private/internal ranges.
pub fn is_private(ip: IpAddr) -> bool {
    PRIVATE_RANGES
        .iter()
        .filter_map(|cidr| cidr.parse::<IpNetwork>().ok())
        .any(|net| net.contains(ip))
}

/// Lookup against an ip-api.com style JSON endpoint.
pub struct IpApiResolver {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    country: Option<String>,
}

impl IpApiResolver {
    pub fn new(endpoint: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: endpoint.trim_end_matches('/').to_string() })
    }

    async fn lookup(&self, ip: IpAddr) -> crate::Result<Option<String>> {
        let url = format!("{}/{}", self.endpoint, ip);
        let resp = self
            .client
            .get(&url)
            .query(&[("fields", "country,query")])
            .send()
            .await?
            .error_for_status()?;
        let body: IpApiResponse = resp.json().await?;
        Ok(body.country.filter(|c| !c.is_empty()))
    }
}

#[async_trait]
impl GeoResolver for IpApiResolver {
    async fn country(&self, ip: Option<&str>) -> Country {
        let ip = match classify_address(ip) {
            Ok(ip) => ip,
            Err(sentinel) => return sentinel,
        };
        match self.lookup(ip).await {
            Ok(Some(name)) => Country::Named(name),
            Ok(None) => Country::Unknown,
            Err(e) => {
                warn!(%ip, error = %e, "geolocation lookup failed");
                Country::Unavailable
            }
        }
    }
}

/// Short-circuits addresses that must not reach the network.
pub fn classify_address(ip: Option<&str>) -> Result<IpAddr, Country> {
    let raw = match ip.map(str::trim) {
        Some(s) if !s.is_empty() && s != NOT_AVAILABLE => s,
        _ => return Err(Country::Private),
    };
    match raw.parse::<IpAddr>() {
        Ok(addr) if is_private(addr) => Err(Country::Private),
        Ok(addr) => Ok(addr),
        Err(_) => {
            debug!(ip = raw, "unparseable address, skipping lookup");
            Err(Country::Unavailable)
        }
    }
}
