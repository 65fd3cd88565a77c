use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Recognized leave types with their annual entitlement in days.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum LeaveType {
    #[strum(serialize = "Casual Leave")]
    #[serde(rename = "Casual Leave")]
    Casual,
    #[strum(serialize = "Duty Leave")]
    #[serde(rename = "Duty Leave")]
    Duty,
    #[strum(serialize = "Vacation Leave")]
    #[serde(rename = "Vacation Leave")]
    Vacation,
    #[strum(serialize = "Maternity Leave")]
    #[serde(rename = "Maternity Leave")]
    Maternity,
    #[strum(serialize = "Compensatory Leave")]
    #[serde(rename = "Compensatory Leave")]
    Compensatory,
}

impl LeaveType {
    /// Maximum leave value that may be consumed per calendar year.
    pub fn annual_limit(&self) -> f64 {
        match self {
            LeaveType::Casual => 15.0,
            LeaveType::Duty => 15.0,
            LeaveType::Vacation => 30.0,
            LeaveType::Maternity => 90.0,
            LeaveType::Compensatory => 365.0,
        }
    }
}

/// Day session of a leave. "Morning" is accepted as a legacy alias for
/// Forenoon on input; Forenoon is what gets stored.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum Session {
    #[strum(serialize = "Full Day")]
    #[serde(rename = "Full Day")]
    FullDay,
    #[strum(to_string = "Forenoon", serialize = "Forenoon", serialize = "Morning")]
    #[serde(rename = "Forenoon", alias = "Morning")]
    Forenoon,
    Afternoon,
}

impl Session {
    pub fn is_half_day(&self) -> bool {
        matches!(self, Session::Forenoon | Session::Afternoon)
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum LeaveStatus {
    Pending,
    Recommended,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Approved and Rejected are final; no action may leave them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "staff_id": 42,
    "leave_type": "Casual Leave",
    "session": "Full Day",
    "from_date": "2024-03-01",
    "to_date": "2024-03-03",
    "leave_value": 3.0,
    "reason": "Medical checkup",
    "description": null,
    "status": "Pending",
    "recommended_by": null,
    "approved_by": null,
    "approved_at": null,
    "is_admin_entry": false,
    "created_at": "2024-02-28T09:15:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub staff_id: u64,
    #[schema(example = "Casual Leave", value_type = String)]
    pub leave_type: String,
    #[schema(example = "Full Day", value_type = String)]
    pub session: String,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = 3.0)]
    pub leave_value: f64,
    pub reason: String,
    pub description: Option<String>,
    #[schema(example = "Pending", value_type = String)]
    pub status: String,
    #[schema(example = "HOD", value_type = Option<String>)]
    pub recommended_by: Option<String>,
    pub approved_by: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<DateTime<Utc>>,
    pub is_admin_entry: bool,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_type_parses_stored_strings() {
        assert_eq!("Casual Leave".parse::<LeaveType>(), Ok(LeaveType::Casual));
        assert_eq!(
            "Compensatory Leave".parse::<LeaveType>(),
            Ok(LeaveType::Compensatory)
        );
        assert!("Sick Leave".parse::<LeaveType>().is_err());
        assert_eq!(LeaveType::Vacation.to_string(), "Vacation Leave");
    }

    #[test]
    fn annual_limits_match_policy() {
        assert_eq!(LeaveType::Casual.annual_limit(), 15.0);
        assert_eq!(LeaveType::Duty.annual_limit(), 15.0);
        assert_eq!(LeaveType::Vacation.annual_limit(), 30.0);
        assert_eq!(LeaveType::Maternity.annual_limit(), 90.0);
        assert_eq!(LeaveType::Compensatory.annual_limit(), 365.0);
    }

    #[test]
    fn morning_is_an_alias_for_forenoon() {
        assert_eq!("Morning".parse::<Session>(), Ok(Session::Forenoon));
        assert_eq!("Forenoon".parse::<Session>(), Ok(Session::Forenoon));
        assert_eq!(Session::Forenoon.to_string(), "Forenoon");
        assert!(Session::Forenoon.is_half_day());
        assert!(Session::Afternoon.is_half_day());
        assert!(!Session::FullDay.is_half_day());
    }

    #[test]
    fn terminal_statuses() {
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(!LeaveStatus::Recommended.is_terminal());
    }
}
