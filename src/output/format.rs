//! Human-readable formatting helpers for the status tables.

/// Format a byte count the way the service tables print memory:
/// two decimals and a single-letter unit, `0B` for zero.
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "K", "M", "G", "T", "P"];
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}B", bytes)
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}

/// Parse a systemd-style memory string ("512.0K", "1.2G", "87B") to bytes.
pub fn parse_memory_to_bytes(memory: &str) -> u64 {
    let memory = memory.trim();
    if memory.is_empty() {
        return 0;
    }
    let split = memory
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(memory.len());
    let value: f64 = match memory[..split].parse() {
        Ok(v) => v,
        Err(_) => return 0,
    };
    let multiplier: u64 = match memory[split..].trim().chars().next() {
        None | Some('B') | Some('b') => 1,
        Some('K') | Some('k') => 1024,
        Some('M') | Some('m') => 1024u64.pow(2),
        Some('G') | Some('g') => 1024u64.pow(3),
        Some('T') | Some('t') => 1024u64.pow(4),
        Some('P') | Some('p') => 1024u64.pow(5),
        Some(_) => 1,
    };
    (value * multiplier as f64) as u64
}

/// Format an elapsed duration the way the tables print runtimes:
/// "45s ago", "12min ago", "3h 4min ago".
pub fn format_elapsed(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}min ago", seconds / 60)
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        format!("{}h {}min ago", hours, minutes)
    }
}

/// Whether a runtime string denotes a unit active for less than a minute
/// (these rows blink in the table to flag a recent restart).
pub fn is_recent_runtime(runtime: &str) -> bool {
    let mut chars = runtime.chars();
    let digits: String = chars.by_ref().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty() && runtime[digits.len()..].trim_start().starts_with('s')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0B");
        assert_eq!(humanize_bytes(512), "512B");
        assert_eq!(humanize_bytes(2048), "2.00K");
        assert_eq!(humanize_bytes(1_610_612_736), "1.50G");
    }

    #[test]
    fn test_parse_memory_to_bytes() {
        assert_eq!(parse_memory_to_bytes("87B"), 87);
        assert_eq!(parse_memory_to_bytes("2.0K"), 2048);
        assert_eq!(parse_memory_to_bytes("1.5G"), 1_610_612_736);
        assert_eq!(parse_memory_to_bytes(""), 0);
        assert_eq!(parse_memory_to_bytes("garbage"), 0);
    }

    #[test]
    fn test_roundtrip_memory() {
        let formatted = humanize_bytes(3_221_225_472);
        assert_eq!(parse_memory_to_bytes(&formatted), 3_221_225_472);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(45), "45s ago");
        assert_eq!(format_elapsed(180), "3min ago");
        assert_eq!(format_elapsed(3900), "1h 5min ago");
    }

    #[test]
    fn test_is_recent_runtime() {
        assert!(is_recent_runtime("45s ago"));
        assert!(is_recent_runtime("5 s ago"));
        assert!(!is_recent_runtime("3min ago"));
        assert!(!is_recent_runtime("N/A"));
    }
}
