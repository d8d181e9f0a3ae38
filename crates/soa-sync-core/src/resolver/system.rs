// # System Resolver
//
// Resolves master nameservers with a DNS A query against the nameservers in
// the system's resolver configuration (`/etc/resolv.conf` on Unix).
//
// The hosts file is never consulted: control-panel hosts commonly map their
// own nameserver name to a loopback address there, which is useless to a
// remote slave.
//
// Only IPv4 addresses are considered usable: slave zones are configured with
// the A record of the master, as the control panel's own xfer templates are.

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use std::net::IpAddr;

use crate::traits::MasterResolver;

/// Resolver querying the system's configured DNS servers
#[derive(Clone)]
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl std::fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResolver").finish_non_exhaustive()
    }
}

impl SystemResolver {
    /// Create a resolver from the system configuration
    ///
    /// Falls back to hickory's default upstreams when the system
    /// configuration cannot be read.
    pub fn new() -> Self {
        let (config, opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!("Could not read system resolver configuration: {}", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self::with_config(config, opts)
    }

    /// Create a resolver with explicit upstreams
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(config, dns_only(opts)),
        }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Restrict lookups to DNS answers
fn dns_only(mut opts: ResolverOpts) -> ResolverOpts {
    opts.use_hosts_file = false;
    opts
}

#[async_trait]
impl MasterResolver for SystemResolver {
    async fn lookup(&self, hostname: &str) -> Option<IpAddr> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            tracing::warn!("Could not establish the IP for the master server: empty hostname");
            return None;
        }

        // Literal addresses need no lookup
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return ip.is_ipv4().then_some(ip);
        }

        let found = match self.resolver.ipv4_lookup(hostname).await {
            Ok(answer) => answer.iter().next().map(|a| IpAddr::V4(a.0)),
            Err(e) => {
                tracing::debug!("A lookup of {} failed: {}", hostname, e);
                None
            }
        };

        match found {
            Some(ip) => {
                tracing::debug!("Master dns server ip: {}", ip);
                Some(ip)
            }
            None => {
                tracing::warn!("Could not establish the IP for the master server {}", hostname);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::config::NameServerConfigGroup;
    use std::time::Duration;

    /// Resolver whose only upstream is a closed local port
    fn unreachable_upstream() -> SystemResolver {
        let servers = NameServerConfigGroup::from_ips_clear(&[IpAddr::from([127, 0, 0, 1])], 9, true);
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(200);
        opts.attempts = 1;
        SystemResolver::with_config(ResolverConfig::from_parts(None, vec![], servers), opts)
    }

    #[tokio::test]
    async fn test_literal_ipv4_is_returned() {
        let resolver = unreachable_upstream();
        assert_eq!(
            resolver.lookup("192.0.2.10").await,
            Some(IpAddr::from([192, 0, 2, 10]))
        );
    }

    #[tokio::test]
    async fn test_empty_and_ipv6_literals_are_unusable() {
        let resolver = unreachable_upstream();
        assert_eq!(resolver.lookup("  ").await, None);
        assert_eq!(resolver.lookup("2001:db8::1").await, None);
    }

    #[test]
    fn test_hosts_file_is_never_used() {
        let mut opts = ResolverOpts::default();
        opts.use_hosts_file = true;
        assert!(!dns_only(opts).use_hosts_file);
    }

    #[tokio::test]
    async fn test_name_without_dns_answer_is_none() {
        let resolver = unreachable_upstream();
        assert_eq!(resolver.lookup("ns1.example.com").await, None);
    }
}
