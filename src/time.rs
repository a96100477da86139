//! Parsing and application of the modem's NTP-synchronized clock.

use chrono::{DateTime, FixedOffset, TimeZone};
use log::warn;

use crate::error::{Error, Result};

/// Sink for the real-time clock once the modem has told us the correct
/// wall-clock time. Split out as a trait so tests can capture the value
/// instead of touching the host clock.
pub trait ClockSink {
    fn set_datetime(&mut self, datetime: DateTime<FixedOffset>) -> Result<()>;
}

/// The default sink: logs the intended time. Setting the host system clock
/// requires elevated privileges this driver does not assume it has; a
/// deployment that wants the OS clock adjusted should supply its own
/// `ClockSink`.
pub struct LoggingClockSink;

impl ClockSink for LoggingClockSink {
    fn set_datetime(&mut self, datetime: DateTime<FixedOffset>) -> Result<()> {
        warn!("modem reports time {datetime}; no system clock sink configured, logging only");
        Ok(())
    }
}

/// Parses the `+CCLK` response body (`"yy/mm/dd,hh:mm:ss+zz"`, quotes
/// already stripped by the caller) into a timezone-aware timestamp.
///
/// The modem reports the offset in quarter-hours; the sign is kept as
/// written (`+` east, `-` west).
pub fn parse_cclk(body: &str) -> Result<DateTime<FixedOffset>> {
    let body = body.trim_matches('"');
    let (date_time, quarter_hours) = split_offset(body)
        .ok_or_else(|| Error::Operation(format!("malformed +CCLK response: {body}")))?;
    let mut parts = date_time.splitn(2, ',');
    let date = parts
        .next()
        .ok_or_else(|| Error::Operation(format!("malformed +CCLK date: {body}")))?;
    let time = parts
        .next()
        .ok_or_else(|| Error::Operation(format!("malformed +CCLK time: {body}")))?;

    let mut date_fields = date.splitn(3, '/');
    let yy: i32 = parse_field(date_fields.next(), body)?;
    let mm: u32 = parse_field(date_fields.next(), body)?;
    let dd: u32 = parse_field(date_fields.next(), body)?;

    let mut time_fields = time.splitn(3, ':');
    let hh: u32 = parse_field(time_fields.next(), body)?;
    let min: u32 = parse_field(time_fields.next(), body)?;
    let ss: u32 = parse_field(time_fields.next(), body)?;

    let offset_secs = quarter_hours * 15 * 60;
    let tz = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| Error::Operation(format!("out-of-range timezone offset in {body}")))?;

    tz.with_ymd_and_hms(2000 + yy, mm, dd, hh, min, ss)
        .single()
        .ok_or_else(|| Error::Operation(format!("invalid +CCLK timestamp: {body}")))
}

/// Splits the trailing signed quarter-hour offset off the date/time body,
/// returning `(date_time, quarter_hours)`.
fn split_offset(body: &str) -> Option<(&str, i32)> {
    let split_at = body.rfind(['+', '-'])?;
    let (date_time, offset) = body.split_at(split_at);
    let quarter_hours: i32 = offset.parse().ok()?;
    Some((date_time, quarter_hours))
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, body: &str) -> Result<T> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::Operation(format!("malformed +CCLK field in: {body}")))
}

/// NTP failure codes the modem may report via `+CNTP`'s numeric result.
/// Per design notes: any other code is treated as success, mirroring the
/// original tracker's (accidentally dead) failure branch.
pub const NTP_FAILURE_CODES: [i32; 5] = [61, 62, 63, 64, 65];

#[cfg(test)]
mod tests {
    use super::*;

    struct Captured(Option<DateTime<FixedOffset>>);

    impl ClockSink for Captured {
        fn set_datetime(&mut self, datetime: DateTime<FixedOffset>) -> Result<()> {
            self.0 = Some(datetime);
            Ok(())
        }
    }

    #[test]
    fn parses_positive_offset() {
        let dt = parse_cclk("\"24/12/24,10:48:23+04\"").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-12-24 10:48:23");
        assert_eq!(dt.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn parses_negative_offset() {
        let dt = parse_cclk("25/01/02,00:05:09-08").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), -2 * 3600);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_cclk("garbage").is_err());
    }

    #[test]
    fn clock_sink_captures_value() {
        let mut sink = Captured(None);
        let dt = parse_cclk("24/01/01,00:00:00+00").unwrap();
        sink.set_datetime(dt).unwrap();
        assert_eq!(sink.0, Some(dt));
    }
}
