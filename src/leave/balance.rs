use crate::model::leave_request::{LeaveStatus, LeaveType};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = "Casual Leave", value_type = String)]
    pub leave_type: LeaveType,
    #[schema(example = 15.0)]
    pub limit: f64,
    #[schema(example = 4.5)]
    pub used: f64,
    #[schema(example = 10.5)]
    pub remaining: f64,
}

/// First and last calendar day of `year`.
pub fn year_bounds(year: i32) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year start");
    let end = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year end");
    (start, end)
}

/// Remaining entitlement never goes negative; overdrawn balances report 0.
pub fn remaining(limit: f64, used: f64) -> f64 {
    (limit - used).max(0.0)
}

/// Leave value consumed by `staff_id` for one type within `year`. Counts
/// only Approved requests whose from_date falls inside the year, matching
/// how usage is attributed at submission time. Recomputed on every call;
/// there is no stored running counter to drift.
pub async fn used_in_year(
    pool: &MySqlPool,
    staff_id: u64,
    leave_type: LeaveType,
    year: i32,
) -> Result<f64, sqlx::Error> {
    let (year_start, year_end) = year_bounds(year);

    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT COALESCE(SUM(leave_value), 0)
        FROM leaves
        WHERE staff_id = ?
        AND leave_type = ?
        AND status = ?
        AND from_date BETWEEN ? AND ?
        "#,
    )
    .bind(staff_id)
    .bind(leave_type.to_string())
    .bind(LeaveStatus::Approved.to_string())
    .bind(year_start)
    .bind(year_end)
    .fetch_one(pool)
    .await
}

pub async fn remaining_balance(
    pool: &MySqlPool,
    staff_id: u64,
    leave_type: LeaveType,
    year: i32,
) -> Result<LeaveBalance, sqlx::Error> {
    let limit = leave_type.annual_limit();
    let used = used_in_year(pool, staff_id, leave_type, year).await?;

    Ok(LeaveBalance {
        leave_type,
        limit,
        used,
        remaining: remaining(limit, used),
    })
}

/// One balance entry per leave type for a staff member.
pub async fn balance_summary(
    pool: &MySqlPool,
    staff_id: u64,
    year: i32,
) -> Result<Vec<LeaveBalance>, sqlx::Error> {
    let mut balances = Vec::new();
    for leave_type in LeaveType::iter() {
        balances.push(remaining_balance(pool, staff_id, leave_type, year).await?);
    }
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds_cover_the_full_year() {
        let (start, end) = year_bounds(2024);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(start < end);
    }

    #[test]
    fn remaining_never_goes_negative() {
        assert_eq!(remaining(15.0, 4.5), 10.5);
        // Exhausted entitlement reports exactly zero.
        assert_eq!(remaining(15.0, 15.0), 0.0);
        // Overdrawn (out-of-band edits) still reports zero, not a credit.
        assert_eq!(remaining(15.0, 21.0), 0.0);
    }

    #[test]
    fn remaining_is_a_pure_function_of_its_inputs() {
        let first = remaining(30.0, 12.5);
        let second = remaining(30.0, 12.5);
        assert_eq!(first, second);
    }
}
