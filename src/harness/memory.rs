//! Resident-set size probe.

use std::fs;

/// Resident memory of this process in kB, from `/proc/self/status`.
///
/// Returns `None` where procfs is unavailable.
pub fn resident_kb() -> Option<u64> {
    let status = fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

/// Extract the `VmRSS:` value (kB) from the text of a procfs status file.
pub fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

/// `"1234 kB"`, or `"n/a"` when the probe is unavailable.
pub fn describe(kb: Option<u64>) -> String {
    match kb {
        Some(kb) => format!("{} kB", kb),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_rss() {
        let status = "Name:\tmatmul\nVmPeak:\t  9000 kB\nVmRSS:\t    4321 kB\nThreads:\t1\n";
        assert_eq!(parse_vm_rss(status), Some(4321));
    }

    #[test]
    fn test_parse_vm_rss_missing() {
        assert_eq!(parse_vm_rss("Name:\tmatmul\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\tgarbage kB\n"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(Some(12)), "12 kB");
        assert_eq!(describe(None), "n/a");
    }
}
