//! Hostname resolution
//!
//! Queries that are not IP literals are handed to a [`Resolver`]. The default
//! [`SystemResolver`] asks the operating system resolver and takes the first
//! address it returns, which may be IPv6.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// Turns a hostname into a single IP address
pub trait Resolver: Send + Sync {
    /// Resolve `host`, failing if it has no addresses
    fn resolve(&self, host: &str) -> io::Result<IpAddr>;
}

/// Resolver backed by the operating system (`getaddrinfo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<IpAddr> {
        (host, 0)
            .to_socket_addrs()?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses found for {}", host),
                )
            })
    }
}

impl<F> Resolver for F
where
    F: Fn(&str) -> io::Result<IpAddr> + Send + Sync,
{
    fn resolve(&self, host: &str) -> io::Result<IpAddr> {
        self(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_system_resolver_literal() {
        let ip = SystemResolver.resolve("127.0.0.1").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |host: &str| -> io::Result<IpAddr> {
            match host {
                "example.test" => Ok(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))),
                _ => Err(io::Error::new(io::ErrorKind::NotFound, "unknown host")),
            }
        };
        assert_eq!(
            resolver.resolve("example.test").unwrap(),
            IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))
        );
        assert!(resolver.resolve("other.test").is_err());
    }
}
