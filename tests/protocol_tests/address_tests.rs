//! Address Tests
//!
//! IPv6 literal detection and host:port composition.

use filerelay::protocol::{bracket_host, join_host_port};

#[test]
fn test_ipv4_passes_through() {
    assert_eq!(bracket_host("127.0.0.1"), "127.0.0.1");
    assert_eq!(join_host_port("127.0.0.1", "9000"), "127.0.0.1:9000");
}

#[test]
fn test_hostname_passes_through() {
    assert_eq!(join_host_port("localhost", "80"), "localhost:80");
}

#[test]
fn test_ipv6_is_bracketed() {
    assert_eq!(bracket_host("::1"), "[::1]");
    assert_eq!(join_host_port("fe80::1", "9000"), "[fe80::1]:9000");
}

#[test]
fn test_already_bracketed_is_untouched() {
    assert_eq!(join_host_port("[::1]", "9000"), "[::1]:9000");
}

#[test]
fn test_composed_ipv6_address_parses() {
    let addr: std::net::SocketAddr = join_host_port("::1", "9000").parse().unwrap();
    assert!(addr.is_ipv6());
    assert_eq!(addr.port(), 9000);
}
