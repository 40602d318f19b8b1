use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

/// Timestamp layout used by equipment log lines, e.g. `2023/11/14 10:31:02.123456`.
///
/// `%.f` accepts any fractional-second width on input; rendering always
/// writes six digits so re-exports line up column for column.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.f";

/// Render a timestamp the way the equipment writes it, with microseconds.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y/%m/%d %H:%M:%S%.6f").to_string()
}

/// Short content hash of the raw input using SHA256.
///
/// Sixteen hex characters is enough to tell two uploads apart while
/// staying readable in report headers and file names.
pub fn content_fingerprint(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Format a microsecond duration for display.
pub fn format_duration_us(us: i64) -> String {
    if us < 0 {
        return format!("-{}", format_duration_us(-us));
    }
    if us < 1_000 {
        format!("{}us", us)
    } else if us < 1_000_000 {
        format!("{:.1}ms", us as f64 / 1_000.0)
    } else if us < 60_000_000 {
        format!("{:.2}s", us as f64 / 1_000_000.0)
    } else {
        let total_secs = us / 1_000_000;
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_short_stable_hex() {
        let a = content_fingerprint("Core:Send");
        let b = content_fingerprint("Core:Send");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, content_fingerprint("Core:Receive"));
    }

    #[test]
    fn duration_formatting_scales_with_magnitude() {
        assert_eq!(format_duration_us(750), "750us");
        assert_eq!(format_duration_us(45_300), "45.3ms");
        assert_eq!(format_duration_us(2_500_000), "2.50s");
        assert_eq!(format_duration_us(92_000_000), "1m 32s");
        assert_eq!(format_duration_us(-45_300), "-45.3ms");
    }

    #[test]
    fn timestamp_round_trips_through_log_format() {
        let ts =
            NaiveDateTime::parse_from_str("2023/11/14 10:31:02.123456", LOG_TIMESTAMP_FORMAT)
                .unwrap();
        assert_eq!(format_timestamp(&ts), "2023/11/14 10:31:02.123456");

        // Short fractions parse too; rendering pads back to six digits.
        let ts = NaiveDateTime::parse_from_str("2023/11/14 10:31:02.5", LOG_TIMESTAMP_FORMAT)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2023/11/14 10:31:02.500000");
    }
}
