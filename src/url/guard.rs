//! Private-network guard applied before every outbound request
//!
//! A host is blocked when it is `localhost` (or a `*.localhost` name), or an
//! IP literal in a loopback, private, link-local, unique-local, unspecified
//! or broadcast range. Domain names are additionally resolved and blocked
//! when any resolved address falls in one of those ranges.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use url::{Host, Url};

/// Why a URL was refused by the guard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockReason {
    #[error("URL has no host")]
    NoHost,

    #[error("local hostname {0}")]
    LocalHostname(String),

    #[error("non-public address {0}")]
    PrivateAddress(IpAddr),

    #[error("{host} resolves to non-public address {addr}")]
    ResolvesToPrivate { host: String, addr: IpAddr },
}

/// Returns true for addresses that must never be fetched
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_ipv4(v4),
        IpAddr::V6(v6) => is_blocked_ipv6(v6),
    }
}

fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_ipv4(v4);
    }

    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fe80::/10
        || (first & 0xffc0) == 0xfe80
        // fc00::/7, includes fd00::/8
        || (first & 0xfe00) == 0xfc00
}

/// Checks the host of a URL without touching the network
///
/// Catches IP literals and local hostnames, which is enough for redirect
/// hops where no async resolution is possible.
pub fn check_url_host(url: &Url) -> Result<(), BlockReason> {
    match url.host() {
        None => Err(BlockReason::NoHost),
        Some(Host::Ipv4(v4)) => check_ip(IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => check_ip(IpAddr::V6(v6)),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                Err(BlockReason::LocalHostname(domain))
            } else {
                Ok(())
            }
        }
    }
}

fn check_ip(ip: IpAddr) -> Result<(), BlockReason> {
    if is_blocked_ip(ip) {
        Err(BlockReason::PrivateAddress(ip))
    } else {
        Ok(())
    }
}

/// Why a name could not be resolved to public addresses
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Blocked(#[from] BlockReason),

    #[error("DNS lookup for {host} failed: {source}")]
    Lookup {
        host: String,
        source: std::io::Error,
    },
}

/// Resolves a host name, refusing the answer when any address is non-public
///
/// Used both by the up-front check and by the HTTP client's resolver, so the
/// addresses that are checked are the addresses that get connected to.
pub async fn resolve_public(host: &str) -> Result<Vec<IpAddr>, ResolveError> {
    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|source| ResolveError::Lookup {
            host: host.to_string(),
            source,
        })?;

    let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
    if let Some(ip) = ips.iter().copied().find(|ip| is_blocked_ip(*ip)) {
        return Err(BlockReason::ResolvesToPrivate {
            host: host.to_string(),
            addr: ip,
        }
        .into());
    }
    Ok(ips)
}

/// Full check: host literal first, then every DNS answer for domain names
///
/// A name that does not resolve is let through; the request itself then
/// fails as a network error.
pub async fn check_url(url: &Url) -> Result<(), BlockReason> {
    check_url_host(url)?;

    let Some(Host::Domain(domain)) = url.host() else {
        return Ok(());
    };

    match resolve_public(domain).await {
        Ok(_) => Ok(()),
        Err(ResolveError::Blocked(reason)) => Err(reason),
        Err(e) => {
            tracing::debug!("{}", e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked(s: &str) -> bool {
        check_url_host(&Url::parse(s).unwrap()).is_err()
    }

    #[test]
    fn test_blocks_required_hosts_for_any_scheme_and_path() {
        for host in ["127.0.0.1", "10.1.2.3", "192.168.1.1", "localhost"] {
            for scheme in ["http", "https"] {
                for path in ["", "/", "/admin", "/a/b?c=d"] {
                    let url = format!("{}://{}{}", scheme, host, path);
                    assert!(blocked(&url), "{} was not blocked", url);
                }
            }
        }
        assert!(blocked("http://127.0.0.1:8080/x"));
        assert!(blocked("https://LOCALHOST:3000/"));
    }

    #[test]
    fn test_blocks_ipv4_ranges() {
        assert!(blocked("http://127.255.0.9/"));
        assert!(blocked("http://172.16.0.1/"));
        assert!(blocked("http://172.31.255.255/"));
        assert!(blocked("http://169.254.169.254/latest/meta-data"));
        assert!(blocked("http://0.0.0.0/"));
        assert!(!blocked("http://172.32.0.1/"));
        assert!(!blocked("http://93.184.216.34/"));
    }

    #[test]
    fn test_blocks_ipv6_ranges() {
        assert!(blocked("http://[::1]/"));
        assert!(blocked("http://[fe80::1]/"));
        assert!(blocked("http://[fc00::1]/"));
        assert!(blocked("http://[fd12:3456::1]/"));
        assert!(blocked("http://[::ffff:10.0.0.1]/"));
        assert!(!blocked("http://[2606:4700::1111]/"));
    }

    #[test]
    fn test_blocks_localhost_subdomains() {
        assert!(blocked("http://app.localhost/"));
        assert!(!blocked("http://localhost.example.com/"));
    }

    #[test]
    fn test_public_domain_passes_literal_check() {
        assert!(!blocked("https://example.com/page"));
    }

    #[tokio::test]
    async fn test_full_check_blocks_literals_without_dns() {
        let url = Url::parse("http://10.1.2.3/").unwrap();
        assert_eq!(
            check_url(&url).await,
            Err(BlockReason::PrivateAddress("10.1.2.3".parse().unwrap()))
        );
    }

    #[tokio::test]
    async fn test_resolved_local_name_is_blocked() {
        let result = resolve_public("localhost").await;
        assert!(
            matches!(
                result,
                Err(ResolveError::Blocked(BlockReason::ResolvesToPrivate { .. }))
            ),
            "{:?}",
            result
        );
    }
}
