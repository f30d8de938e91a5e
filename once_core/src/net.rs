//! Outbound address lookup for the printed share URL

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Public address used only to pick a route; no packet is ever sent
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Best-effort address other machines can reach us on. Never fails.
pub async fn outbound_ip() -> IpAddr {
    match probe_route().await {
        Some(ip) => ip,
        None => lan_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    }
}

/// Ask the OS which local address it would use to reach the internet
async fn probe_route() -> Option<IpAddr> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0))).await.ok()?;
    socket.connect(PROBE_ADDR).await.ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() || ip.is_loopback() {
        return None;
    }
    Some(ip)
}

/// Scan interfaces, prioritizing LAN ranges (192.168.x.x, 10.x.x.x, 172.x.x.x)
fn lan_ip() -> Option<IpAddr> {
    let interfaces = local_ip_address::list_afinet_netifas().ok()?;
    pick_lan_ip(interfaces.into_iter().map(|(_name, ip)| ip))
}

fn pick_lan_ip(candidates: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    let mut best: Option<(u8, IpAddr)> = None;
    for ip in candidates {
        let IpAddr::V4(v4) = ip else { continue };
        if v4.is_loopback() {
            continue;
        }
        let rank = match v4.octets() {
            [192, 168, ..] => return Some(ip),
            [10, ..] => 1,
            [172, ..] => 2,
            _ => 3,
        };
        if best.is_none_or(|(r, _)| rank < r) {
            best = Some((rank, ip));
        }
    }
    best.map(|(_, ip)| ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_prefers_192_168() {
        let picked = pick_lan_ip([ip("10.0.0.5"), ip("127.0.0.1"), ip("192.168.1.7")]);
        assert_eq!(picked, Some(ip("192.168.1.7")));
    }

    #[test]
    fn test_ranking_without_192_168() {
        let picked = pick_lan_ip([ip("8.8.4.4"), ip("172.16.0.2"), ip("10.1.2.3")]);
        assert_eq!(picked, Some(ip("10.1.2.3")));

        let picked = pick_lan_ip([ip("8.8.4.4"), ip("172.16.0.2")]);
        assert_eq!(picked, Some(ip("172.16.0.2")));
    }

    #[test]
    fn test_skips_loopback_and_ipv6() {
        assert_eq!(pick_lan_ip([ip("127.0.0.1"), ip("::1"), ip("fe80::1")]), None);
    }

    #[tokio::test]
    async fn test_outbound_ip_never_fails() {
        let ip = outbound_ip().await;
        assert!(!ip.is_unspecified());
    }
}
