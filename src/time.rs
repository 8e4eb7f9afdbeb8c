//! Wall clock, sleeping, and the dense calendar timestamp used by file
//! properties.

use std::time::{Duration, Instant};

use crate::platform::{Platform, PlatformProcess};

/// Calendar time in UTC.
///
/// `mon` and `day` are zero based (January is 0, the first of the month is 0).
/// `sec` may be 60 to represent a leap second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DateTime {
    pub year: i32,
    pub mon: u32,
    pub day: u32,
    pub hour: u32,
    pub min: u32,
    pub sec: u32,
    pub msec: u32,
}

/// A calendar time packed into one integer.
///
/// Each field is folded in from most to least significant, so comparing two
/// `DenseTime` values compares the calendar times they encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DenseTime(pub u64);

// shifts signed years into the unsigned encoding
const YEAR_BIAS: i64 = 0x8000;

impl From<DateTime> for DenseTime {
    fn from(date_time: DateTime) -> Self {
        let year = (i64::from(date_time.year) + YEAR_BIAS).max(0) as u64;
        let mut result = year;
        result = result * 12 + u64::from(date_time.mon);
        result = result * 31 + u64::from(date_time.day);
        result = result * 24 + u64::from(date_time.hour);
        result = result * 60 + u64::from(date_time.min);
        result = result * 61 + u64::from(date_time.sec);
        result = result * 1000 + u64::from(date_time.msec);
        DenseTime(result)
    }
}

impl From<DenseTime> for DateTime {
    fn from(dense: DenseTime) -> Self {
        let mut value = dense.0;
        let msec = (value % 1000) as u32;
        value /= 1000;
        let sec = (value % 61) as u32;
        value /= 61;
        let min = (value % 60) as u32;
        value /= 60;
        let hour = (value % 24) as u32;
        value /= 24;
        let day = (value % 31) as u32;
        value /= 31;
        let mon = (value % 12) as u32;
        value /= 12;
        let year = (value as i64 - YEAR_BIAS) as i32;
        DateTime {
            year,
            mon,
            day,
            hour,
            min,
            sec,
            msec,
        }
    }
}

impl DateTime {
    /// Converts seconds since the Unix epoch (UTC) to calendar time, using
    /// the proleptic Gregorian calendar.
    pub fn from_unix(secs: i64, msec: u32) -> DateTime {
        let days = secs.div_euclid(86_400);
        let secs_of_day = secs.rem_euclid(86_400);
        let (year, mon, day) = civil_from_days(days);

        DateTime {
            year: year as i32,
            mon,
            day,
            hour: (secs_of_day / 3600) as u32,
            min: ((secs_of_day % 3600) / 60) as u32,
            sec: (secs_of_day % 60) as u32,
            msec: msec.min(999),
        }
    }
}

impl DenseTime {
    pub fn from_unix(secs: i64, msec: u32) -> DenseTime {
        DenseTime::from(DateTime::from_unix(secs, msec))
    }
}

/// Days since 1970-01-01 to (year, zero based month, zero based day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    // months counted from March
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5;
    let month = if shifted_month < 10 {
        shifted_month + 2
    } else {
        shifted_month - 10
    };
    let year = year_of_era + era * 400 + i64::from(month <= 1);
    (year, month as u32, day as u32)
}

/// Seconds since the Unix epoch
pub fn now_unix() -> u64 {
    Platform::now_unix()
}

/// Blocks the calling thread for at least `duration`.
pub fn sleep(duration: Duration) {
    let start = Instant::now();
    let mut remaining = duration;
    while !remaining.is_zero() {
        Platform::sleep(remaining);
        remaining = duration.saturating_sub(start.elapsed());
    }
}

pub fn sleep_ms(msec: u32) {
    sleep(Duration::from_millis(u64::from(msec)));
}
