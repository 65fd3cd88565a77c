use crate::leave::value;
use crate::model::leave_request::{LeaveStatus, LeaveType, Session};
use crate::model::role::ReviewTier;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::collections::HashMap;

/// Stamp carried by rows the importer auto-approves.
pub const BULK_UPLOAD_ACTOR: &str = "Admin Bulk Upload";
pub const BULK_UPLOAD_REASON: &str = "Bulk Upload";

/// Spreadsheet rows arrive with the header row consumed, so the first data
/// row is row 2 in the sheet the operator is looking at.
const HEADER_ROW_OFFSET: usize = 2;

/// Day 0 of the spreadsheet date-serial scheme.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// One loosely-typed row from the external spreadsheet parser. Dates may be
/// calendar text or a numeric date serial; every field is untrusted.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct BulkLeaveRow {
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "Leave Type")]
    pub leave_type: Option<String>,
    #[serde(default, alias = "From Date")]
    #[schema(value_type = Option<String>)]
    pub from_date: Option<Value>,
    #[serde(default, alias = "To Date")]
    #[schema(value_type = Option<String>)]
    pub to_date: Option<Value>,
    #[serde(default, alias = "Session")]
    pub session: Option<String>,
    #[serde(default, alias = "Reason")]
    pub reason: Option<String>,
    #[serde(default, alias = "Status")]
    pub status: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, strum_macros::Display)]
pub enum RowErrorKind {
    MissingEmail,
    StaffNotFound,
    UnknownLeaveType,
    InvalidDate,
    InvalidDateRange,
    InvalidSession,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RowError {
    #[schema(example = 2)]
    pub row: usize,
    #[schema(example = "StaffNotFound", value_type = String)]
    pub kind: RowErrorKind,
    #[schema(example = "no staff found for email 'ghost@college.edu'")]
    pub message: String,
}

impl RowError {
    fn new(row: usize, kind: RowErrorKind, message: String) -> Self {
        RowError { row, kind, message }
    }
}

/// A row that survived validation and is ready for a batched write.
#[derive(Debug)]
pub struct StagedLeave {
    pub staff_id: u64,
    pub leave_type: LeaveType,
    pub session: Session,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub leave_value: f64,
    pub reason: String,
    pub status: LeaveStatus,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImportReport {
    #[schema(example = 498)]
    pub success_count: u64,
    pub errors: Vec<RowError>,
}

/// Parse a spreadsheet date cell: numeric serials count days from the
/// spreadsheet epoch, strings are tried against the formats operators
/// actually paste.
pub fn parse_cell_date(cell: &Value) -> Option<NaiveDate> {
    match cell {
        Value::Number(n) => {
            let serial = n.as_f64()?;
            let (y, m, d) = EXCEL_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
            epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
        }
        Value::String(s) => {
            let s = s.trim();
            for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
                if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                    return Some(date);
                }
            }
            None
        }
        _ => None,
    }
}

/// Validate a single row against the same rules as interactive submission.
/// `directory` maps lowercased email -> staff id.
pub fn validate_row(
    row: &BulkLeaveRow,
    row_num: usize,
    directory: &HashMap<String, u64>,
) -> Result<StagedLeave, RowError> {
    let email = row
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            RowError::new(row_num, RowErrorKind::MissingEmail, "missing email".into())
        })?;

    let staff_id = *directory.get(&email.to_lowercase()).ok_or_else(|| {
        RowError::new(
            row_num,
            RowErrorKind::StaffNotFound,
            format!("no staff found for email '{email}'"),
        )
    })?;

    let type_text = row.leave_type.as_deref().map(str::trim).unwrap_or("");
    let leave_type = type_text.parse::<LeaveType>().map_err(|_| {
        RowError::new(
            row_num,
            RowErrorKind::UnknownLeaveType,
            format!("invalid or missing leave type '{type_text}'"),
        )
    })?;

    let from_date = row
        .from_date
        .as_ref()
        .and_then(parse_cell_date)
        .ok_or_else(|| {
            RowError::new(row_num, RowErrorKind::InvalidDate, "invalid from date".into())
        })?;
    let to_date = row
        .to_date
        .as_ref()
        .and_then(parse_cell_date)
        .ok_or_else(|| {
            RowError::new(row_num, RowErrorKind::InvalidDate, "invalid to date".into())
        })?;

    if from_date > to_date {
        return Err(RowError::new(
            row_num,
            RowErrorKind::InvalidDateRange,
            "'from date' cannot be after 'to date'".into(),
        ));
    }

    let session_text = row
        .session
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Full Day");
    let session = session_text.parse::<Session>().map_err(|_| {
        RowError::new(
            row_num,
            RowErrorKind::InvalidSession,
            format!("invalid session '{session_text}', must be 'Full Day', 'Forenoon' or 'Afternoon'"),
        )
    })?;

    let (from_date, to_date) = value::normalize_range(session, from_date, to_date);
    let leave_value = value::leave_value(session, from_date, to_date);

    let status = row
        .status
        .as_deref()
        .and_then(|s| s.trim().parse::<LeaveStatus>().ok())
        .unwrap_or(LeaveStatus::Approved);

    let reason = row
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(BULK_UPLOAD_REASON)
        .to_string();

    Ok(StagedLeave {
        staff_id,
        leave_type,
        session,
        from_date,
        to_date,
        leave_value,
        reason,
        status,
    })
}

/// Validate every row independently. A bad row is logged and skipped; it
/// never stops the rest of the batch.
pub fn validate_rows(
    rows: &[BulkLeaveRow],
    directory: &HashMap<String, u64>,
) -> (Vec<StagedLeave>, Vec<RowError>) {
    let mut staged = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match validate_row(row, index + HEADER_ROW_OFFSET, directory) {
            Ok(leave) => staged.push(leave),
            Err(error) => errors.push(error),
        }
    }

    (staged, errors)
}

/// Write staged rows in insert groups of at most `batch_size`. A committed
/// group's builder is never reused: every group constructs its own, which
/// is what keeps writes past the first group from being dropped.
pub async fn persist_staged(
    pool: &MySqlPool,
    staged: &[StagedLeave],
    batch_size: usize,
) -> Result<u64, sqlx::Error> {
    let mut inserted: u64 = 0;

    for group in staged.chunks(batch_size.max(1)) {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "INSERT INTO leaves \
             (staff_id, leave_type, session, from_date, to_date, leave_value, \
              reason, status, recommended_by, approved_by, approved_at, is_admin_entry) ",
        );

        builder.push_values(group, |mut b, leave| {
            let approved = leave.status == LeaveStatus::Approved;
            b.push_bind(leave.staff_id)
                .push_bind(leave.leave_type.to_string())
                .push_bind(leave.session.to_string())
                .push_bind(leave.from_date)
                .push_bind(leave.to_date)
                .push_bind(leave.leave_value)
                .push_bind(leave.reason.clone())
                .push_bind(leave.status.to_string())
                .push_bind(match leave.status {
                    LeaveStatus::Recommended => Some(ReviewTier::Hod.to_string()),
                    _ => None,
                })
                .push_bind(approved.then(|| BULK_UPLOAD_ACTOR.to_string()))
                .push_bind(approved.then(Utc::now))
                .push_bind(true);
        });

        builder.build().execute(pool).await?;
        inserted += group.len() as u64;
        tracing::debug!(group_len = group.len(), inserted, "bulk insert group committed");
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directory() -> HashMap<String, u64> {
        let mut map = HashMap::new();
        map.insert("john.doe@college.edu".to_string(), 42);
        map.insert("jane@college.edu".to_string(), 7);
        map
    }

    fn row(email: &str, leave_type: &str, from: &str, to: &str) -> BulkLeaveRow {
        BulkLeaveRow {
            email: Some(email.to_string()),
            leave_type: Some(leave_type.to_string()),
            from_date: Some(json!(from)),
            to_date: Some(json!(to)),
            ..BulkLeaveRow::default()
        }
    }

    #[test]
    fn valid_row_stages_with_defaults() {
        let staged = validate_row(
            &row("John.Doe@college.edu", "Casual Leave", "2024-03-01", "2024-03-03"),
            2,
            &directory(),
        )
        .unwrap();

        assert_eq!(staged.staff_id, 42);
        assert_eq!(staged.leave_type, LeaveType::Casual);
        assert_eq!(staged.session, Session::FullDay);
        assert_eq!(staged.leave_value, 3.0);
        assert_eq!(staged.status, LeaveStatus::Approved);
        assert_eq!(staged.reason, BULK_UPLOAD_REASON);
    }

    #[test]
    fn unknown_email_is_a_row_error() {
        let err = validate_row(
            &row("ghost@college.edu", "Casual Leave", "2024-03-01", "2024-03-03"),
            5,
            &directory(),
        )
        .unwrap_err();
        assert_eq!(err.kind, RowErrorKind::StaffNotFound);
        assert_eq!(err.row, 5);
    }

    #[test]
    fn unknown_leave_type_is_a_row_error() {
        let err = validate_row(
            &row("jane@college.edu", "Sick Leave", "2024-03-01", "2024-03-03"),
            3,
            &directory(),
        )
        .unwrap_err();
        assert_eq!(err.kind, RowErrorKind::UnknownLeaveType);
    }

    #[test]
    fn unparseable_date_is_a_row_error() {
        let err = validate_row(
            &row("jane@college.edu", "Duty Leave", "soon", "2024-03-03"),
            3,
            &directory(),
        )
        .unwrap_err();
        assert_eq!(err.kind, RowErrorKind::InvalidDate);
    }

    #[test]
    fn inverted_range_is_rejected_and_batch_continues() {
        // Scenario: one bad range among good rows must not poison the rest.
        let rows = vec![
            row("jane@college.edu", "Casual Leave", "2024-05-10", "2024-05-05"),
            row("john.doe@college.edu", "Casual Leave", "2024-05-05", "2024-05-10"),
        ];
        let (staged, errors) = validate_rows(&rows, &directory());

        assert_eq!(staged.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, RowErrorKind::InvalidDateRange);
        assert_eq!(errors[0].row, 2);
        assert_eq!(staged[0].leave_value, 6.0);
    }

    #[test]
    fn invalid_session_is_a_row_error() {
        let mut bad = row("jane@college.edu", "Casual Leave", "2024-03-01", "2024-03-01");
        bad.session = Some("Evening".to_string());
        let err = validate_row(&bad, 4, &directory()).unwrap_err();
        assert_eq!(err.kind, RowErrorKind::InvalidSession);
    }

    #[test]
    fn half_day_session_forces_single_day() {
        let mut half = row("jane@college.edu", "Casual Leave", "2024-03-01", "2024-03-09");
        half.session = Some("Afternoon".to_string());
        let staged = validate_row(&half, 2, &directory()).unwrap();
        assert_eq!(staged.leave_value, 0.5);
        assert_eq!(staged.to_date, staged.from_date);
    }

    #[test]
    fn numeric_date_serials_parse_from_spreadsheet_epoch() {
        // 45292 days after 1899-12-30 is 2024-01-01.
        assert_eq!(
            parse_cell_date(&json!(45292)),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            parse_cell_date(&json!("2024-01-01")),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            parse_cell_date(&json!("01-02-2024")),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(parse_cell_date(&json!(null)), None);
        assert_eq!(parse_cell_date(&json!("yesterday")), None);
    }

    #[test]
    fn five_hundred_rows_split_into_two_insert_groups() {
        // Regression shape for the committed-batch-reuse defect: 500 staged
        // rows at the 450-row store limit must produce exactly two groups
        // covering every row.
        let rows: Vec<BulkLeaveRow> = (0..500)
            .map(|_| row("jane@college.edu", "Duty Leave", "2024-03-01", "2024-03-01"))
            .collect();
        let (staged, errors) = validate_rows(&rows, &directory());
        assert!(errors.is_empty());
        assert_eq!(staged.len(), 500);

        let groups: Vec<_> = staged.chunks(450).collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 450);
        assert_eq!(groups[1].len(), 50);
        assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), 500);
    }

    #[test]
    fn explicit_row_fields_override_defaults() {
        let mut explicit = row("jane@college.edu", "Vacation Leave", "2024-07-01", "2024-07-05");
        explicit.reason = Some("Summer break".to_string());
        explicit.status = Some("Pending".to_string());
        let staged = validate_row(&explicit, 2, &directory()).unwrap();
        assert_eq!(staged.reason, "Summer break");
        assert_eq!(staged.status, LeaveStatus::Pending);
    }
}
