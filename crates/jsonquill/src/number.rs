//! Text formatting for numbers and timestamps.

use core::fmt::{self, Write};

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike};

use crate::sink::ByteSink;

pub(crate) fn write_integer<I: itoa::Integer>(sink: &mut ByteSink, n: I) {
    let mut buf = itoa::Buffer::new();
    sink.write_str(buf.format(n));
}

/// Shortest round-trip decimal. Integral values drop the `.0` suffix and
/// non-finite values become `null`, which is the only JSON spelling available
/// for them.
pub(crate) fn write_f64(sink: &mut ByteSink, value: f64) {
    if !value.is_finite() {
        sink.write_str("null");
        return;
    }
    let mut buf = ryu::Buffer::new();
    let text = buf.format_finite(value);
    sink.write_str(text.strip_suffix(".0").unwrap_or(text));
}

pub(crate) fn write_f32(sink: &mut ByteSink, value: f32) {
    if !value.is_finite() {
        sink.write_str("null");
        return;
    }
    let mut buf = ryu::Buffer::new();
    let text = buf.format_finite(value);
    sink.write_str(text.strip_suffix(".0").unwrap_or(text));
}

/// Same text as [`write_f64`], for `Display` impls.
pub(crate) fn fmt_f64(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if !value.is_finite() {
        return f.write_str("null");
    }
    let mut buf = ryu::Buffer::new();
    let text = buf.format_finite(value);
    f.write_str(text.strip_suffix(".0").unwrap_or(text))
}

/// Whether the timestamp's year has the four digits RFC 3339 requires.
pub(crate) fn rfc3339_year_in_range<Tz: TimeZone>(t: &DateTime<Tz>) -> bool {
    (0..10_000).contains(&t.year())
}

/// RFC 3339 with up to nine fractional digits, trailing zeros trimmed, and
/// `Z` for a zero offset. The year must already be in range.
pub(crate) fn write_rfc3339_nanos<Tz: TimeZone>(sink: &mut ByteSink, t: &DateTime<Tz>) {
    // chrono folds a leap second into the nanosecond field.
    let (second, nanos) = match t.nanosecond() {
        n if n >= 1_000_000_000 => (60, n - 1_000_000_000),
        n => (t.second(), n),
    };
    let _ = write!(
        sink,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        second,
    );
    if nanos != 0 {
        let mut digits = 9;
        let mut frac = nanos;
        while frac % 10 == 0 {
            frac /= 10;
            digits -= 1;
        }
        let _ = write!(sink, ".{frac:0digits$}");
    }

    let offset = t.offset().fix().local_minus_utc();
    if offset == 0 {
        sink.write_byte(b'Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let offset = offset.unsigned_abs();
        let _ = write!(sink, "{sign}{:02}:{:02}", offset / 3600, offset / 60 % 60);
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use chrono::{FixedOffset, NaiveDate, Utc};
    use rstest::rstest;

    use super::*;

    fn render(f: impl FnOnce(&mut ByteSink)) -> String {
        let mut sink = ByteSink::new();
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[rstest]
    #[case(0.0, "0")]
    #[case(1.0, "1")]
    #[case(-2.5, "-2.5")]
    #[case(0.1, "0.1")]
    #[case(1e21, "1e21")]
    #[case(f64::NAN, "null")]
    #[case(f64::INFINITY, "null")]
    fn floats(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(render(|s| write_f64(s, value)), expected);
    }

    #[test]
    fn f32_uses_its_own_shortest_form() {
        assert_eq!(render(|s| write_f32(s, 0.1)), "0.1");
    }

    #[rstest]
    #[case(i64::MIN, "-9223372036854775808")]
    #[case(0, "0")]
    #[case(42, "42")]
    fn integers(#[case] value: i64, #[case] expected: &str) {
        assert_eq!(render(|s| write_integer(s, value)), expected);
    }

    #[rstest]
    #[case(0, "2024-03-05T07:08:09Z")]
    #[case(500_000_000, "2024-03-05T07:08:09.5Z")]
    #[case(123_456_789, "2024-03-05T07:08:09.123456789Z")]
    #[case(1_000, "2024-03-05T07:08:09.000001Z")]
    fn rfc3339_trims_fraction(#[case] nanos: u32, #[case] expected: &str) {
        let t = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_nano_opt(7, 8, 9, nanos)
            .unwrap()
            .and_utc();
        assert_eq!(render(|s| write_rfc3339_nanos(s, &t)), expected);
    }

    #[test]
    fn rfc3339_writes_offset() {
        let tz = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        let t = tz.with_ymd_and_hms(1999, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(
            render(|s| write_rfc3339_nanos(s, &t)),
            "1999-12-31T23:59:00-05:30"
        );
    }

    #[test]
    fn year_range() {
        let ok = Utc.with_ymd_and_hms(9999, 1, 1, 0, 0, 0).unwrap();
        let bad = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
        let negative = Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap();
        assert!(rfc3339_year_in_range(&ok));
        assert!(!rfc3339_year_in_range(&bad));
        assert!(!rfc3339_year_in_range(&negative));
    }
}
