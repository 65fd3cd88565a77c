use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Departments are a closed set; registration rejects anything else.
pub const DEPARTMENTS: &[&str] = &[
    "Civil Engineering",
    "Electrical & Electronics Engineering",
    "Computer Science & Engineering",
    "Basic Science & Humanities",
    "Physical Education",
];

/// Designations offered by the registration form.
pub const DESIGNATIONS: &[&str] = &[
    "Principal",
    "Director",
    "ERP Admin",
    "Head of Department",
    "Professor",
    "Associate Professor",
    "Assistant Professor",
    "Lab Instructor",
    "System Administrator",
    "Network Administrator",
    "Administrative Staff",
];

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum StaffStatus {
    Active,
    Inactive,
    #[strum(serialize = "On Leave")]
    #[serde(rename = "On Leave")]
    OnLeave,
    Resigned,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 42,
    "display_name": "John Doe",
    "salutation": "Dr.",
    "email": "john.doe@college.edu",
    "department": "Computer Science & Engineering",
    "designation": "Assistant Professor",
    "status": "Active",
    "date_of_joining": "2020-06-01",
    "appointment_no": "APT-2020-042"
}))]
pub struct Staff {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub display_name: String,

    #[schema(example = "Dr.", nullable = true)]
    pub salutation: Option<String>,

    #[schema(example = "john.doe@college.edu")]
    pub email: String,

    #[schema(example = "Computer Science & Engineering")]
    pub department: String,

    #[schema(example = "Assistant Professor")]
    pub designation: String,

    #[schema(example = "Active")]
    pub status: String,

    #[schema(example = "2020-06-01", value_type = String, format = "date")]
    pub date_of_joining: NaiveDate,

    #[schema(example = "APT-2020-042", nullable = true)]
    pub appointment_no: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_status_on_leave_uses_spaced_wire_string() {
        assert_eq!("On Leave".parse::<StaffStatus>(), Ok(StaffStatus::OnLeave));
        assert_eq!(StaffStatus::OnLeave.to_string(), "On Leave");
        assert!("Retired".parse::<StaffStatus>().is_err());
    }

    #[test]
    fn department_set_is_closed() {
        assert_eq!(DEPARTMENTS.len(), 5);
        assert!(DEPARTMENTS.contains(&"Physical Education"));
        assert!(!DEPARTMENTS.contains(&"Mechanical Engineering"));
    }
}
