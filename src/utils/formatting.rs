/// Format bytes in human-readable format (B, KB, MB, GB, TB)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Format a span in seconds, switching to ms/µs for short gaps
pub fn format_seconds(seconds: f64) -> String {
    let abs = seconds.abs();
    if abs == 0.0 {
        "0s".to_string()
    } else if abs < 1e-3 {
        format!("{:.1}µs", seconds * 1e6)
    } else if abs < 1.0 {
        format!("{:.1}ms", seconds * 1e3)
    } else if abs < 60.0 {
        format!("{:.2}s", seconds)
    } else {
        let whole = seconds as u64;
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

/// Short axis label: 1500 -> "1.5k", 65535 -> "65.5k"
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else if abs >= 10.0 || abs == 0.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// TCP flag bits as a zero-padded binary label, at least five digits
pub fn format_flags(flags: u32) -> String {
    format!("{:05b}", flags)
}

/// Truncate string to specified length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0s");
        assert_eq!(format_seconds(0.0000025), "2.5µs");
        assert_eq!(format_seconds(0.1), "100.0ms");
        assert_eq!(format_seconds(2.5), "2.50s");
        assert_eq!(format_seconds(90.0), "1m 30s");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0.0), "0");
        assert_eq!(format_compact(40.0), "40");
        assert_eq!(format_compact(1500.0), "1.5k");
        assert_eq!(format_compact(0.25), "0.25");
        assert_eq!(format_compact(2_000_000.0), "2.0M");
    }

    #[test]
    fn test_format_flags() {
        assert_eq!(format_flags(0), "00000");
        assert_eq!(format_flags(0x12), "10010");
        assert_eq!(format_flags(32), "100000");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("hi", 2), "hi");
    }
}
