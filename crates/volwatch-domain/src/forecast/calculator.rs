use chrono::{DateTime, NaiveTime, Utc};

use crate::shared::DomainError;

pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Minutes of the day used as the extrapolation base.
///
/// Measured against 23:59 UTC of `now`'s date:
/// `round(1440 - seconds_until_23_59 / 60)`. After 23:59 the distance is
/// negative and the result exceeds 1440.
pub fn minutes_elapsed_equivalent(now: DateTime<Utc>) -> i64 {
    let end_of_day = now
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN))
        .and_utc();
    let seconds_until_end = (end_of_day - now).num_milliseconds() as f64 / 1000.0;

    (MINUTES_PER_DAY - seconds_until_end / 60.0).round() as i64
}

/// Linear extrapolation of today's cumulative value to a full-day total.
pub fn project(current_value: i64, now: DateTime<Utc>) -> Result<i64, DomainError> {
    let minutes = minutes_elapsed_equivalent(now);
    if minutes <= 0 {
        return Err(DomainError::IndeterminateForecast(format!(
            "no elapsed minutes at {}",
            now.to_rfc3339()
        )));
    }

    let forecast = (current_value as f64 / minutes as f64 * MINUTES_PER_DAY).round();
    if !forecast.is_finite() || forecast.abs() >= i64::MAX as f64 {
        return Err(DomainError::IndeterminateForecast(format!(
            "forecast out of range for value {current_value}"
        )));
    }

    Ok(forecast as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 15, h, m, s).unwrap()
    }

    #[test]
    fn test_minutes_at_noon() {
        // 23:59 is 719 minutes after noon
        assert_eq!(minutes_elapsed_equivalent(utc(12, 0, 0)), 721);
    }

    #[test]
    fn test_minutes_at_day_edges() {
        assert_eq!(minutes_elapsed_equivalent(utc(0, 0, 0)), 1);
        assert_eq!(minutes_elapsed_equivalent(utc(23, 59, 0)), 1440);
        assert_eq!(minutes_elapsed_equivalent(utc(23, 59, 59)), 1441);
    }

    #[test]
    fn test_project_at_noon() {
        // round(500 / 721 * 1440) = round(998.61)
        assert_eq!(project(500, utc(12, 0, 0)).unwrap(), 999);
    }

    #[test]
    fn test_project_is_deterministic() {
        let now = utc(7, 31, 12);
        let a = project(12_345, now).unwrap();
        let b = project(12_345, now).unwrap();
        assert_eq!(a, b);

        let minutes = minutes_elapsed_equivalent(now) as f64;
        assert_eq!(a, (12_345.0 / minutes * 1440.0).round() as i64);
    }

    #[test]
    fn test_project_zero_value() {
        assert_eq!(project(0, utc(9, 0, 0)).unwrap(), 0);
    }

    #[test]
    fn test_full_day_keeps_value() {
        assert_eq!(project(3000, utc(23, 59, 0)).unwrap(), 3000);
    }

    #[test]
    fn test_overflowing_value_is_indeterminate() {
        let err = project(i64::MAX, utc(0, 0, 0)).unwrap_err();
        assert!(matches!(err, DomainError::IndeterminateForecast(_)));
    }
}
