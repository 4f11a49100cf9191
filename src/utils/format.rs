//! Human-readable formatting helpers

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Format a byte count as `512 B`, `1.50 KB`, `12.34 MB`, ...
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
