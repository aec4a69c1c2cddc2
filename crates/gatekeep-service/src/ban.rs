//! Permanent ban set.
//!
//! Once an address is inserted it stays banned for the life of the process.
//! There is no removal path.

use std::net::IpAddr;

use dashmap::DashSet;

use crate::error::ServiceError;

/// Storage for banned client addresses.
///
/// Implementations must make `insert` idempotent: inserting an address that
/// is already present returns `Ok(false)`, never an error. Callers pass
/// addresses already normalised with [`normalize_ip`].
pub trait BanStore: Send + Sync {
    /// Whether `ip` is banned.
    fn contains(&self, ip: IpAddr) -> Result<bool, ServiceError>;

    /// Bans `ip`. Returns `true` only if this call added it.
    fn insert(&self, ip: IpAddr) -> Result<bool, ServiceError>;
}

/// In-memory ban set backed by a sharded concurrent hash set.
#[derive(Default)]
pub struct BanSet {
    ips: DashSet<IpAddr>,
}

impl BanSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }
}

impl BanStore for BanSet {
    fn contains(&self, ip: IpAddr) -> Result<bool, ServiceError> {
        Ok(self.ips.contains(&ip))
    }

    fn insert(&self, ip: IpAddr) -> Result<bool, ServiceError> {
        Ok(self.ips.insert(ip))
    }
}

/// Collapses IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) to plain IPv4 so
/// every client has exactly one key in the engine's maps.
pub fn normalize_ip(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::sync::Arc;

    #[test]
    fn insert_is_idempotent() {
        let bans = BanSet::new();
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        assert!(!bans.contains(ip).unwrap());
        assert!(bans.insert(ip).unwrap());
        assert!(!bans.insert(ip).unwrap());
        assert!(bans.contains(ip).unwrap());
        assert_eq!(bans.len(), 1);
    }

    #[test]
    fn concurrent_duplicate_inserts_add_once() {
        let bans = Arc::new(BanSet::new());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bans = Arc::clone(&bans);
                std::thread::spawn(move || bans.insert(ip).unwrap())
            })
            .collect();
        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();

        assert_eq!(added, 1);
        assert_eq!(bans.len(), 1);
    }

    #[test]
    fn mapped_ipv6_normalizes_to_ipv4() {
        let v4 = Ipv4Addr::new(192, 168, 1, 10);
        let mapped = IpAddr::V6(v4.to_ipv6_mapped());
        assert_eq!(normalize_ip(mapped), IpAddr::V4(v4));

        let plain_v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(normalize_ip(plain_v6), plain_v6);
    }
}
