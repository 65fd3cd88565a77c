use crate::api::leave_request::{
    BalanceQuery, LeaveFilter, LeaveListResponse, SubmitLeave,
};
use crate::api::staff::{CreateStaff, StaffListResponse, StaffQuery};
use crate::leave::balance::LeaveBalance;
use crate::leave::import::{BulkLeaveRow, ImportReport, RowError};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, Session};
use crate::model::staff::{Staff, StaffStatus};
use crate::models::{ChangePasswordReq, LoginReqDto};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management Portal API",
        version = "1.0.0",
        description = r#"
## Leave Management Portal

This API powers a leave-management portal for an academic institution.

### Key Features
- **Leave Requests**
  - Submit leave, track status, view history and remaining balances
- **Approval Workflow**
  - Role-based review chain (HOD -> Director -> Principal) with an
    escalation path for Compensatory Leave and an admin shortcut
- **Staff Directory**
  - Register, list, and maintain staff profiles
- **Bulk Import**
  - Batched creation of pre-validated leave records from spreadsheets

### Security
Endpoints are protected with **JWT Bearer authentication**; review and
registration operations are restricted by role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_queue,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::recommend_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::bulk_import::bulk_import,

        crate::api::staff::create_staff,
        crate::api::staff::get_staff,
        crate::api::staff::list_staffs,
        crate::api::staff::update_staff,

        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::change_password
    ),
    components(
        schemas(
            SubmitLeave,
            LeaveFilter,
            BalanceQuery,
            LeaveRequest,
            LeaveListResponse,
            LeaveBalance,
            LeaveType,
            LeaveStatus,
            Session,
            BulkLeaveRow,
            RowError,
            ImportReport,
            CreateStaff,
            Staff,
            StaffStatus,
            StaffQuery,
            StaffListResponse,
            LoginReqDto,
            ChangePasswordReq
        )
    ),
    tags(
        (name = "Leave", description = "Leave request and workflow APIs"),
        (name = "Staff", description = "Staff directory APIs"),
        (name = "Auth", description = "Authentication APIs"),
    )
)]
pub struct ApiDoc;
