//! elapsed.rs
//!
//! This module breaks the time elapsed since an anchor date into
//!     "X years, Y months, Z days, H hours, M minutes, S seconds"
//!
//! Chrono does not provide a built-in year/month/day diff (unlike Python's
//! relativedelta), so the calendar part is done by hand:
//!   • whole years are counted by comparing calendar fields, so a period
//!     is never overcounted (Feb 29 to the next Feb 28 is not a year)
//!   • the anchor is advanced by those years with chrono's end-of-month
//!     clamping, then whole months are counted and added the same way
//!   • what is left is a fixed-length span, split into days, hours,
//!     minutes, seconds
//!
//! Adding the parts back in that order (years, months, then the rest)
//! lands on "now" to the second.
//!
//! A Feb 29 anchor whose year shift clamps to Feb 28 can reach that same
//! Feb 28 a year later without completing another year; the month count
//! stops at 11 there and the days carry the remainder (up to 31).
//!
//! Both instants are local wall-clock times; a day is 24 wall-clock hours.

use chrono::{DateTime, Datelike, Months, NaiveDateTime, TimeZone};
use serde::Serialize;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Calendar decomposition of the time between an anchor and "now".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Breakdown {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Breakdown {
    pub fn is_zero(&self) -> bool {
        *self == Breakdown::default()
    }
}

/// Returns the elapsed time between `anchor` and `now`.
///
/// An anchor in the future yields the all-zero breakdown.
pub fn compute(anchor: NaiveDateTime, now: NaiveDateTime) -> Breakdown {
    if anchor > now {
        return Breakdown::default();
    }

    // Clamping only ever moves an advanced anchor earlier and neither
    // count overshoots, so every step lands at or before `now`.
    let years = whole_months_between(anchor, now) / 12;
    let after_years = add_months(anchor, years.saturating_mul(12), now);

    let months = whole_months_between(after_years, now).min(11);
    let after_months = add_months(after_years, months, now);

    // Sub-second remainders are dropped; the span is non-negative so
    // truncation is a floor.
    let rest = (now - after_months).num_seconds().max(0);

    Breakdown {
        years,
        months,
        days: (rest / SECS_PER_DAY) as u32,
        hours: (rest % SECS_PER_DAY / SECS_PER_HOUR) as u32,
        minutes: (rest % SECS_PER_HOUR / SECS_PER_MINUTE) as u32,
        seconds: (rest % SECS_PER_MINUTE) as u32,
    }
}

/// Same as [`compute`], with both instants read on the anchor's wall clock.
pub fn compute_local<Tz: TimeZone>(anchor: &DateTime<Tz>, now: &DateTime<Tz>) -> Breakdown {
    let now = now.with_timezone(&anchor.timezone());
    compute(anchor.naive_local(), now.naive_local())
}

fn add_months(from: NaiveDateTime, months: u32, now: NaiveDateTime) -> NaiveDateTime {
    from.checked_add_months(Months::new(months)).unwrap_or(now)
}

/// Number of whole calendar months from `earlier` to `later`.
///
/// One month is subtracted when `later` has not yet reached the anchor's
/// day-of-month and time-of-day in its own month.
fn whole_months_between(earlier: NaiveDateTime, later: NaiveDateTime) -> u32 {
    let mut months = i64::from(later.year() - earlier.year()) * 12 + i64::from(later.month())
        - i64::from(earlier.month());

    if (later.day(), later.time()) < (earlier.day(), earlier.time()) {
        months -= 1;
    }

    months.clamp(0, i64::from(u32::MAX)) as u32
}
