//! Strict parsers for the two temporal representations.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const DATE_LEN: usize = 10;

/// Parse a calendar date written exactly as `YYYY-MM-DD`.
///
/// Unpadded fields, signs, surrounding whitespace and impossible dates are
/// rejected.
pub fn parse_date_strict(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != DATE_LEN {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse an ISO-8601 timestamp and normalize it to UTC.
///
/// Accepted shapes: `YYYY-MM-DD`, then optionally `T` or a space followed by
/// `HH`, `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fffffffff`, then optionally `Z`,
/// `±HH:MM`, `±HHMM` or `±HH`. A value without an offset is taken as UTC.
pub fn parse_iso8601(s: &str) -> Option<NaiveDateTime> {
    parse_iso8601_zoned(s).map(|(utc, _)| utc)
}

/// Like [`parse_iso8601`], also returning the offset in seconds east of UTC
/// when the value carries one. `Z` counts as an explicit offset of zero.
pub(crate) fn parse_iso8601_zoned(s: &str) -> Option<(NaiveDateTime, Option<i32>)> {
    let date = parse_date_strict(s.get(..DATE_LEN)?)?;
    let rest = &s[DATE_LEN..];
    if rest.is_empty() {
        return Some((date.and_hms_opt(0, 0, 0)?, None));
    }

    let mut chars = rest.chars();
    match chars.next() {
        Some('T' | 't' | ' ') => {}
        _ => return None,
    }
    let clock = chars.as_str();

    let (time_part, offset_secs) = split_offset(clock)?;
    let time = parse_time(time_part)?;
    let local = date.and_time(time);

    let offset = FixedOffset::east_opt(offset_secs.unwrap_or(0))?;
    let zoned = offset.from_local_datetime(&local).single()?;
    Some((zoned.naive_utc(), offset_secs))
}

/// Microseconds since the Unix epoch for a UTC timestamp.
pub fn to_epoch_micros(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

/// Days since the Unix epoch.
pub fn to_epoch_days(date: &NaiveDate) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(date.signed_duration_since(epoch).num_days()).ok()
}

fn split_offset(clock: &str) -> Option<(&str, Option<i32>)> {
    if let Some(time) = clock.strip_suffix('Z').or_else(|| clock.strip_suffix('z')) {
        return Some((time, Some(0)));
    }
    match clock.find(['+', '-']) {
        Some(idx) => {
            let sign = if clock.as_bytes()[idx] == b'-' { -1 } else { 1 };
            let secs = parse_offset(&clock[idx + 1..])?;
            Some((&clock[..idx], Some(sign * secs)))
        }
        None => Some((clock, None)),
    }
}

fn parse_offset(s: &str) -> Option<i32> {
    if !s.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match s.len() {
        2 => (&s[..2], "00"),
        4 => (&s[..2], &s[2..]),
        5 if s.as_bytes()[2] == b':' => (&s[..2], &s[3..]),
        _ => return None,
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    // HH alone is an hour, HH:MM is five characters, everything longer must
    // carry seconds.
    let bytes = s.as_bytes();
    if bytes.len() == 2 && bytes.iter().all(u8::is_ascii_digit) {
        let hour: u32 = s.parse().ok()?;
        return NaiveTime::from_hms_opt(hour, 0, 0);
    }
    if bytes.len() < 5 || bytes[2] != b':' {
        return None;
    }
    if bytes.len() == 5 {
        return NaiveTime::parse_from_str(s, "%H:%M").ok();
    }
    if bytes.len() < 8 || bytes[5] != b':' {
        return None;
    }
    if bytes.len() > 8 && (bytes[8] != b'.' && bytes[8] != b',') {
        return None;
    }
    let normalized = s.replace(',', ".");
    NaiveTime::parse_from_str(&normalized, "%H:%M:%S%.f").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_parse_date_strict_valid() {
        assert_eq!(
            parse_date_strict("2021-05-01"),
            NaiveDate::from_ymd_opt(2021, 5, 1)
        );
    }

    #[test]
    fn test_parse_date_strict_rejects() {
        for bad in [
            "2021-13-01",
            "2021-02-30",
            "2021-5-01",
            "2021/05/01",
            " 2021-05-01",
            "2021-05-01T00:00:00",
            "+021-05-01",
            "",
        ] {
            assert!(parse_date_strict(bad).is_none(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_iso8601_shapes() {
        let cases = [
            ("2021-05-01", "2021-05-01 00:00:00"),
            ("2021-05-01T10", "2021-05-01 10:00:00"),
            ("2021-05-01T10Z", "2021-05-01 10:00:00"),
            ("2021-05-01 07", "2021-05-01 07:00:00"),
            ("2021-05-01T10:02", "2021-05-01 10:02:00"),
            ("2021-05-01T10:02:03", "2021-05-01 10:02:03"),
            ("2021-05-01 10:02:03", "2021-05-01 10:02:03"),
            ("2021-05-01T10:02:03Z", "2021-05-01 10:02:03"),
            ("2021-05-01T10:02:03.250Z", "2021-05-01 10:02:03.250"),
            ("2021-05-01T10:02:03,5", "2021-05-01 10:02:03.500"),
            ("2021-05-01T10:02:03.123456789+00:00", "2021-05-01 10:02:03.123456789"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_iso8601(input), Some(utc(expected)), "input {input:?}");
        }
    }

    #[test]
    fn test_parse_iso8601_applies_offsets() {
        assert_eq!(
            parse_iso8601("2021-05-01T12:03:00+02:00"),
            Some(utc("2021-05-01 10:03:00"))
        );
        assert_eq!(
            parse_iso8601("2021-05-01T06:00:00.5+0530"),
            Some(utc("2021-05-01 00:30:00.5"))
        );
        assert_eq!(
            parse_iso8601("2021-05-01T22:00:00-03"),
            Some(utc("2021-05-02 01:00:00"))
        );
        assert_eq!(
            parse_iso8601("2021-05-01T12+02:00"),
            Some(utc("2021-05-01 10:00:00"))
        );
    }

    #[test]
    fn test_parse_iso8601_zoned_reports_offset() {
        assert_eq!(
            parse_iso8601_zoned("2021-05-01T12:03:00+02:00").map(|(_, offset)| offset),
            Some(Some(7200))
        );
        assert_eq!(
            parse_iso8601_zoned("2021-05-01T10:03:00Z").map(|(_, offset)| offset),
            Some(Some(0))
        );
        assert_eq!(
            parse_iso8601_zoned("2021-05-01 10:03:00").map(|(_, offset)| offset),
            Some(None)
        );
        assert_eq!(
            parse_iso8601_zoned("2021-05-01").map(|(_, offset)| offset),
            Some(None)
        );
    }

    #[test]
    fn test_parse_iso8601_rejects() {
        for bad in [
            "2021-13-01T00:00:00",
            "2021-05-01T25:00:00",
            "2021-05-01T1",
            "2021-05-01T24",
            "2021-05-01T1a",
            "2021-05-01X10:00:00",
            "2021-05-01T10:00:00+2:00",
            "2021-05-01T10:00:00+24:00",
            "2021-05-01T10:00:00 UTC",
            "05/01/2021 10:00",
            "yesterday",
        ] {
            assert!(parse_iso8601(bad).is_none(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_epoch_conversions() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(to_epoch_days(&date), Some(1));
        assert_eq!(to_epoch_micros(&utc("1970-01-01 00:00:01")), 1_000_000);
    }
}
