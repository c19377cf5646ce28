//! Time and timestamp helpers.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// UTC timestamp used for interval bounds, overwrite expiry, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the local calendar date of `t` in `tz`.
#[must_use]
pub fn local_date(t: Timestamp, tz: Tz) -> NaiveDate {
    t.with_timezone(&tz).date_naive()
}

/// Return the instant of local midnight of `date` in `tz`.
#[must_use]
pub fn midnight(date: NaiveDate, tz: Tz) -> Timestamp {
    resolve_local(date.and_time(chrono::NaiveTime::MIN), tz)
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant.
/// Times inside a gap (clocks going forward) are shifted forward by the
/// length of a typical DST gap.
#[must_use]
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Timestamp {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(naive + TimeDelta::hours(1))) {
            LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.with_timezone(&Utc),
            LocalResult::None => Utc.from_utc_datetime(&naive),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_compute_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let t = midnight(date, chrono_tz::Europe::Vienna);
        // CET is UTC+1 in January.
        assert_eq!(t.hour(), 23);
        assert_eq!(local_date(t, chrono_tz::Europe::Vienna), date);
    }

    #[test]
    fn should_shift_times_inside_dst_gap() {
        // 2024-03-31 02:30 does not exist in Vienna.
        let naive = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        let t = resolve_local(naive, chrono_tz::Europe::Vienna);
        let local = t.with_timezone(&chrono_tz::Europe::Vienna);
        assert_eq!((local.hour(), local.minute()), (3, 30));
    }

    #[test]
    fn should_pick_earliest_for_ambiguous_times() {
        // 2024-10-27 02:30 happens twice in Vienna; first at 00:30 UTC.
        let naive = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        let t = resolve_local(naive, chrono_tz::Europe::Vienna);
        assert_eq!((t.hour(), t.minute()), (0, 30));
    }
}
