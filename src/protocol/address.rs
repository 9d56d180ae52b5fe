//! Address composition
//!
//! A host containing a colon is taken to be an IPv6 literal and is
//! bracketed before a port is appended.

/// Wrap an IPv6 literal in brackets, pass anything else through
///
/// Hosts that are already bracketed are left alone.
pub fn bracket_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Compose `host:port`, bracketing IPv6 literals
pub fn join_host_port(host: &str, port: &str) -> String {
    format!("{}:{}", bracket_host(host), port)
}
