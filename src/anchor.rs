//! Turning user input into an anchor instant.
//!
//! Accepted forms, tried in order:
//!     2024-02-29T18:30:00+01:00   (RFC 3339, any offset)
//!     2024-02-29 18:30[:00]       (local wall-clock time)
//!     2024-02-29                  (local midnight)
//!
//! Like a date picker capped at today, anchors after "now" are rejected.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_anchor(input: &str, now: &DateTime<Local>) -> Result<DateTime<Local>> {
    let input = input.trim();
    if input.is_empty() {
        bail!("no date given");
    }

    let anchor = parse_any(input).with_context(|| format!("invalid date {input:?}"))?;

    if anchor > *now {
        bail!(
            "{} is in the future (latest allowed is {})",
            anchor.format("%Y-%m-%d %H:%M:%S"),
            now.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(anchor)
}

fn parse_any(input: &str) -> Result<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Local));
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(input, fmt) {
            return resolve_local(ndt);
        }
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .context("expected YYYY-MM-DD, YYYY-MM-DD HH:MM[:SS] or an RFC 3339 timestamp")?;
    local_midnight(date)
}

/// Start of `date` on the local clock.
pub fn local_midnight(date: NaiveDate) -> Result<DateTime<Local>> {
    resolve_local(date.and_time(chrono::NaiveTime::MIN))
}

/// Maps a wall-clock time to an instant, taking the earlier of two
/// candidates when clocks fall back.
fn resolve_local(ndt: NaiveDateTime) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(&ndt)
        .earliest()
        .ok_or_else(|| anyhow!("{ndt} does not exist in the local time zone"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn date_only_is_local_midnight() {
        let a = parse_anchor("2024-02-29", &now()).unwrap();
        assert_eq!(
            a.naive_local(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn local_date_time_keeps_the_wall_clock() {
        let a = parse_anchor(" 2023-10-03 18:30 ", &now()).unwrap();
        assert_eq!(a.naive_local().to_string(), "2023-10-03 18:30:00");

        let b = parse_anchor("2023-10-03T18:30:15", &now()).unwrap();
        assert_eq!(b.naive_local().to_string(), "2023-10-03 18:30:15");
    }

    #[test]
    fn rfc3339_keeps_the_instant() {
        let a = parse_anchor("2024-01-01T00:00:00Z", &now()).unwrap();
        assert_eq!(a.timestamp(), 1_704_067_200);
    }

    #[test]
    fn future_dates_are_rejected() {
        let err = parse_anchor("2024-06-16", &now()).unwrap_err();
        assert!(err.to_string().contains("in the future"));
    }

    #[test]
    fn now_itself_is_allowed() {
        let a = parse_anchor("2024-06-15 12:00:00", &now()).unwrap();
        assert_eq!(a, now());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_anchor("yesterday", &now()).is_err());
        assert!(parse_anchor("2024-02-30", &now()).is_err());
        assert!(parse_anchor("   ", &now()).is_err());
    }
}
