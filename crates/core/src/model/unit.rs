use serde::{Deserialize, Serialize};

/// What the config-space x axis measures; doubles as the axis formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    /// Sample counts (sampled profiles laid out by weight).
    Samples,
    Bytes,
    Percent,
    /// Arbitrary weight.
    Weight,
}

impl ValueUnit {
    /// Format a value in this unit for display.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::Nanoseconds => format_time(value / 1_000_000.0),
            Self::Microseconds => format_time(value / 1_000.0),
            Self::Milliseconds => format_time(value),
            Self::Seconds => format_time(value * 1_000.0),
            Self::Samples => {
                if value.abs() >= 1_000_000.0 {
                    format!("{:.1}M", value / 1_000_000.0)
                } else if value.abs() >= 10_000.0 {
                    format!("{:.1}k", value / 1_000.0)
                } else {
                    format!("{}", value.round() as i64)
                }
            }
            Self::Bytes => {
                let abs = value.abs();
                if abs >= 1_073_741_824.0 {
                    format!("{:.1} GiB", value / 1_073_741_824.0)
                } else if abs >= 1_048_576.0 {
                    format!("{:.1} MiB", value / 1_048_576.0)
                } else if abs >= 1_024.0 {
                    format!("{:.1} KiB", value / 1_024.0)
                } else {
                    format!("{} B", value.round() as i64)
                }
            }
            Self::Percent => format!("{:.1}%", value),
            Self::Weight => format!("{:.0}", value),
        }
    }
}

/// Milliseconds → adaptive label.
fn format_time(ms: f64) -> String {
    let abs = ms.abs();
    if abs == 0.0 {
        "0ms".to_string()
    } else if abs >= 60_000.0 {
        let mins = (ms / 60_000.0).trunc();
        let secs = (ms - mins * 60_000.0) / 1_000.0;
        format!("{mins:.0}m{secs:.1}s")
    } else if abs >= 1_000.0 {
        format!("{:.2}s", ms / 1_000.0)
    } else if abs >= 1.0 {
        format!("{ms:.1}ms")
    } else if abs >= 0.001 {
        format!("{:.1}μs", ms * 1_000.0)
    } else {
        format!("{:.0}ns", ms * 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_units_scale_to_readable_labels() {
        assert_eq!(ValueUnit::Milliseconds.format_value(0.0), "0ms");
        assert_eq!(ValueUnit::Milliseconds.format_value(12.5), "12.5ms");
        assert_eq!(ValueUnit::Milliseconds.format_value(1500.0), "1.50s");
        assert_eq!(ValueUnit::Microseconds.format_value(500.0), "500.0μs");
        assert_eq!(ValueUnit::Nanoseconds.format_value(250.0), "250ns");
        assert_eq!(ValueUnit::Seconds.format_value(90.0), "1m30.0s");
    }

    #[test]
    fn counts_and_sizes() {
        assert_eq!(ValueUnit::Samples.format_value(42.0), "42");
        assert_eq!(ValueUnit::Samples.format_value(25_000.0), "25.0k");
        assert_eq!(ValueUnit::Bytes.format_value(2048.0), "2.0 KiB");
        assert_eq!(ValueUnit::Percent.format_value(12.345), "12.3%");
    }
}
