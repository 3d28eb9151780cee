//! Network context for the streaming server.
//!
//! This module provides the [`IpDetector`] abstraction used to find the
//! LAN-facing IPv4 address clients can reach, and [`UrlBuilder`] for turning
//! that address into connection URLs.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Trait for detecting the local IPv4 address.
///
/// Different environments may need different detection strategies.
/// This trait allows injecting the appropriate detector.
pub trait IpDetector: Send + Sync {
    /// Returns the LAN-facing IPv4 address, or `None` when there is no
    /// active network or no IPv4 address is assigned.
    fn detect(&self) -> Option<Ipv4Addr>;
}

/// Default IP detector using the system's network interfaces.
///
/// Prefers the address of the default-route interface and falls back to the
/// first non-loopback IPv4 address of any interface.
#[derive(Debug, Clone, Default)]
pub struct LocalIpDetector;

impl LocalIpDetector {
    /// Creates a new `LocalIpDetector`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Creates a new `LocalIpDetector` wrapped in an Arc.
    #[must_use]
    pub fn arc() -> Arc<dyn IpDetector> {
        Arc::new(Self::new())
    }
}

impl IpDetector for LocalIpDetector {
    fn detect(&self) -> Option<Ipv4Addr> {
        match local_ip_address::local_ip() {
            Ok(IpAddr::V4(ip)) => return Some(ip),
            Ok(IpAddr::V6(ip)) => {
                log::debug!("[Network] Default interface has IPv6 {}, scanning interfaces", ip);
            }
            Err(e) => {
                log::debug!("[Network] Default interface lookup failed: {}", e);
            }
        }

        let interfaces = match local_ip_address::list_afinet_netifas() {
            Ok(list) => list,
            Err(e) => {
                log::warn!("[Network] Failed to enumerate interfaces: {}", e);
                return None;
            }
        };

        first_lan_ipv4(interfaces.iter().map(|(_, ip)| *ip))
    }
}

/// Picks the first non-loopback, non-unspecified IPv4 address.
fn first_lan_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}

/// Detector that always reports a fixed address.
///
/// Used when the advertise IP is configured explicitly, and in tests.
#[derive(Debug, Clone)]
pub struct StaticIpDetector {
    ip: Option<Ipv4Addr>,
}

impl StaticIpDetector {
    #[must_use]
    pub fn new(ip: Ipv4Addr) -> Self {
        Self { ip: Some(ip) }
    }

    /// A detector that never finds an address (no network).
    #[must_use]
    pub fn none() -> Self {
        Self { ip: None }
    }
}

impl IpDetector for StaticIpDetector {
    fn detect(&self) -> Option<Ipv4Addr> {
        self.ip
    }
}

/// Builder for constructing URLs for the streaming server.
pub struct UrlBuilder {
    ip: String,
    port: u16,
}

impl UrlBuilder {
    /// Creates a new `UrlBuilder` for the given server address.
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// Returns the base URL for the server (e.g., `http://192.168.1.100:8080`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }

    /// Returns the audio URL for a given song ID.
    #[must_use]
    pub fn song_url(&self, song_id: &str) -> String {
        format!("{}/song/{}", self.base_url(), song_id)
    }

    /// Returns the cover art URL for a given song ID.
    #[must_use]
    pub fn art_url(&self, song_id: &str) -> String {
        format!("{}/art/{}", self.base_url(), song_id)
    }
}
