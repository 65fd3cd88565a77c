use crate::model::leave_request::Session;
use chrono::NaiveDate;

/// Number of days a leave deducts from the annual balance. Half-day
/// sessions are worth exactly 0.5 regardless of the date range; full-day
/// leaves count both endpoints. Negative ranges clamp to 0 so a bad range
/// can never credit days back (validation rejects them upstream anyway).
pub fn leave_value(session: Session, from_date: NaiveDate, to_date: NaiveDate) -> f64 {
    if session.is_half_day() {
        return 0.5;
    }
    let days = (to_date - from_date).num_days() + 1;
    if days > 0 { days as f64 } else { 0.0 }
}

/// Half-day sessions span a single calendar day: `to_date` is forced to
/// `from_date`, whatever the caller sent.
pub fn normalize_range(
    session: Session,
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    if session.is_half_day() {
        (from_date, from_date)
    } else {
        (from_date, to_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn half_day_is_half_regardless_of_range() {
        let from = date(2024, 3, 1);
        let far = date(2024, 3, 20);
        assert_eq!(leave_value(Session::Forenoon, from, far), 0.5);
        assert_eq!(leave_value(Session::Afternoon, from, from), 0.5);
    }

    #[test]
    fn half_day_range_collapses_to_from_date() {
        let from = date(2024, 3, 1);
        let to = date(2024, 3, 9);
        assert_eq!(normalize_range(Session::Forenoon, from, to), (from, from));
        assert_eq!(normalize_range(Session::Afternoon, from, to), (from, from));
        assert_eq!(normalize_range(Session::FullDay, from, to), (from, to));
    }

    #[test]
    fn full_day_count_is_inclusive() {
        // Scenario A range: 2024-03-01..2024-03-03 is three days.
        assert_eq!(
            leave_value(Session::FullDay, date(2024, 3, 1), date(2024, 3, 3)),
            3.0
        );
        assert_eq!(
            leave_value(Session::FullDay, date(2024, 3, 1), date(2024, 3, 1)),
            1.0
        );
        // Across a month boundary.
        assert_eq!(
            leave_value(Session::FullDay, date(2024, 2, 28), date(2024, 3, 2)),
            4.0
        );
    }

    #[test]
    fn inverted_range_clamps_to_zero() {
        assert_eq!(
            leave_value(Session::FullDay, date(2024, 5, 10), date(2024, 5, 5)),
            0.0
        );
    }
}
