//! Formatting helpers shared by the report and the models.

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a float in its shortest form, always keeping one decimal.
///
/// `1.0` renders as `"1.0"`, `1.5` as `"1.5"`, `29.97` as `"29.97"`.
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Human-readable byte size using 1024-based units.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = round2(bytes as f64 / divisor as f64);
    format!("{} {}", format_decimal(value), SIZE_UNITS[unit])
}

/// Render seconds as `MM:SS`, truncating fractional seconds.
///
/// Minutes keep counting past 59.
pub fn format_mmss(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
