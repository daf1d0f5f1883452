//! Target list expansion
//!
//! Target entries are single addresses (IP or hostname) or dash-separated
//! IPv4 ranges ("192.168.1.10-192.168.1.20"). Ranges are expanded at config
//! load so everything downstream works on concrete hosts.

use anyhow::{anyhow, Result};
use std::net::Ipv4Addr;

/// Expand a list of addresses and IPv4 ranges into individual hosts.
///
/// An entry counts as a range only when both dash-separated halves parse as
/// IPv4 addresses; anything else (hostnames may contain dashes) passes
/// through untouched.
pub fn expand_targets(entries: &[String]) -> Result<Vec<String>> {
    let mut expanded = Vec::new();

    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        if let Some((start, end)) = parse_range(entry) {
            if u32::from(start) > u32::from(end) {
                return Err(anyhow!("Invalid IP range: {} (start > end)", entry));
            }
            let mut current = u32::from(start);
            while current <= u32::from(end) {
                expanded.push(Ipv4Addr::from(current).to_string());
                current += 1;
            }
        } else {
            expanded.push(entry.to_string());
        }
    }

    Ok(expanded)
}

fn parse_range(entry: &str) -> Option<(Ipv4Addr, Ipv4Addr)> {
    let (start, end) = entry.split_once('-')?;
    let start: Ipv4Addr = start.trim().parse().ok()?;
    let end: Ipv4Addr = end.trim().parse().ok()?;
    Some((start, end))
}
