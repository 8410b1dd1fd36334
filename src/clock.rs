// src/clock.rs
//! Korea Standard Time helpers. The feed, the deadlines and the digest
//! schedule are all expressed in KST (UTC+9, no DST).

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("KST offset within ±24h")
}

pub fn kst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// Calendar date used for days-remaining calculations.
pub fn kst_today() -> NaiveDate {
    kst_now().date_naive()
}

/// Interpret a wall-clock KST datetime as an instant.
pub fn kst_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    local.and_utc() - Duration::seconds(KST_OFFSET_SECS as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_utc_evening_is_next_day_in_kst() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 16, 30, 0).unwrap();
        let local = utc.with_timezone(&kst());
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(kst_to_utc(local.naive_local()), utc);
    }
}
