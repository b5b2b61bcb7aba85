use chrono::{Datelike, NaiveDate};

/// Whole days from `start` to `end`; negative when `end` precedes `start`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// January 1st of the year `date` falls in.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_between() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(days_between(a, b), 365);
        assert_eq!(days_between(b, a), -365);
    }

    #[test]
    fn test_year_start() {
        let d = NaiveDate::from_ymd_opt(2025, 8, 17).unwrap();
        assert_eq!(year_start(d), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
