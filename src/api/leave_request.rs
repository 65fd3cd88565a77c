use crate::auth::auth::AuthUser;
use crate::leave::balance::{self, LeaveBalance};
use crate::leave::value;
use crate::leave::workflow::{self, LeaveAction, WorkflowError, WorkflowState};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, Session};
use crate::model::role::{ReviewTier, Role};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SubmitLeave {
    #[schema(example = "Casual Leave")]
    pub leave_type: LeaveType,
    #[schema(example = "Full Day")]
    pub session: Session,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = "Medical checkup")]
    pub reason: String,
    pub description: Option<String>,
    /// Admin entries name the staff member the leave is recorded for;
    /// everyone else submits against their own profile.
    #[schema(example = 42)]
    pub staff_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 42)]
    /// Filter by staff ID
    pub staff_id: Option<u64>,
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = "Casual Leave")]
    /// Filter by leave type
    pub leave_type: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    #[schema(example = 42)]
    /// Staff to compute the balance for; defaults to the caller's profile
    pub staff_id: Option<u64>,
    #[schema(example = "Casual Leave")]
    /// One leave type; omit for a summary over all types
    pub leave_type: Option<String>,
    #[schema(example = 2024)]
    /// Calendar year; defaults to the current year
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Reconstruct the typed workflow state from stored columns. `None` means
/// the row carries a value outside the closed sets and cannot be acted on.
fn parse_state(status: &str, recommended_by: Option<&str>) -> Option<WorkflowState> {
    Some(WorkflowState {
        status: status.parse::<LeaveStatus>().ok()?,
        recommended_by: recommended_by.and_then(|t| t.parse::<ReviewTier>().ok()),
    })
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = SubmitLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "Pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubmitLeave>,
) -> actix_web::Result<impl Responder> {
    // 1. resolve the staff profile the leave belongs to
    let staff_id: u64 = if auth.role == Role::Admin {
        match payload.staff_id {
            Some(id) => id,
            None => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "staff_id is required for admin entries"
                })));
            }
        }
    } else {
        auth.own_staff_id()?
    };

    let staff_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM staffs WHERE id = ?)")
            .bind(staff_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, staff_id, "Failed to check staff profile");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    if !staff_exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Staff profile not found"
        })));
    }

    // 2. validate dates; half-day sessions span a single day
    let (from_date, to_date) =
        value::normalize_range(payload.session, payload.from_date, payload.to_date);
    if from_date > to_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "from_date cannot be after to_date"
        })));
    }

    // 3. validate reason
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Reason is required"
        })));
    }

    // 4. compute day value
    let leave_value = value::leave_value(payload.session, from_date, to_date);
    if leave_value <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave must cover at least half a day"
        })));
    }

    // 5. initial workflow state is decided by who is submitting
    let state = workflow::initial_state(auth.role);
    let is_admin_entry = auth.role == Role::Admin;
    let approved_by: Option<&str> = is_admin_entry.then_some("Admin");
    let approved_at: Option<DateTime<Utc>> = is_admin_entry.then(Utc::now);

    // 6. insert request
    sqlx::query(
        r#"
        INSERT INTO leaves
            (staff_id, leave_type, session, from_date, to_date, leave_value,
             reason, description, status, recommended_by, approved_by, approved_at, is_admin_entry)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(staff_id)
    .bind(payload.leave_type.to_string())
    .bind(payload.session.to_string())
    .bind(from_date)
    .bind(to_date)
    .bind(leave_value)
    .bind(reason)
    .bind(payload.description.as_deref())
    .bind(state.status.to_string())
    .bind(state.recommended_by.map(|t| t.to_string()))
    .bind(approved_by)
    .bind(approved_at)
    .bind(is_admin_entry)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, staff_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request submitted",
        "status": state.status.to_string()
    })))
}

/* =========================
Workflow actions (reviewers)
========================= */
async fn run_action(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    action: LeaveAction,
) -> actix_web::Result<HttpResponse> {
    let row = sqlx::query_as::<_, (String, String, Option<String>)>(
        "SELECT leave_type, status, recommended_by FROM leaves WHERE id = ?",
    )
    .bind(leave_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (type_text, status_text, recommended_text) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Leave request not found"
            })));
        }
    };

    let leave_type = type_text.parse::<LeaveType>().map_err(|_| {
        tracing::error!(leave_id, leave_type = %type_text, "Stored leave type is unrecognized");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let state = parse_state(&status_text, recommended_text.as_deref()).ok_or_else(|| {
        tracing::error!(leave_id, status = %status_text, "Stored status is unrecognized");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Decide before touching the store; illegal actions never mutate.
    let next = match workflow::apply(leave_type, state, auth.role, action) {
        Ok(next) => next,
        Err(e @ WorkflowError::Terminal(_)) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Leave request already processed: {e}")
            })));
        }
        Err(e) => {
            tracing::info!(leave_id, actor = auth.role.as_str(), %action, error = %e, "Workflow action refused");
            return Ok(HttpResponse::Forbidden().json(json!({
                "message": e.to_string()
            })));
        }
    };

    // The WHERE clause re-checks the state we decided against, so a racing
    // reviewer's write shows up as zero affected rows instead of being
    // silently overwritten.
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = ?, recommended_by = ?
        WHERE id = ?
        AND status = ?
        AND recommended_by <=> ?
        "#,
    )
    .bind(next.status.to_string())
    .bind(next.recommended_by.map(|t| t.to_string()))
    .bind(leave_id)
    .bind(status_text)
    .bind(recommended_text)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, %action, "Leave status update failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        tracing::warn!(leave_id, %action, "Leave request changed under a concurrent reviewer");
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Leave request was modified concurrently, reload and retry"
        })));
    }

    tracing::info!(
        leave_id,
        actor = auth.role.as_str(),
        %action,
        status = %next.status,
        "Leave request updated"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave request {}", next.status.to_string().to_lowercase()),
        "status": next.status.to_string(),
        "recommended_by": next.recommended_by.map(|t| t.to_string())
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/recommend",
    params(("leave_id" = u64, Path, description = "ID of the leave request to recommend")),
    responses(
        (status = 200, description = "Leave recommended to the next tier"),
        (status = 400, description = "Leave request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not this reviewer's turn"),
        (status = 409, description = "Concurrent modification")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn recommend_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    run_action(auth, pool.get_ref(), path.into_inner(), LeaveAction::Recommend).await
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Leave request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the approving authority"),
        (status = 409, description = "Concurrent modification")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    run_action(auth, pool.get_ref(), path.into_inner(), LeaveAction::Approve).await
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Leave request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not this reviewer's turn"),
        (status = 409, description = "Concurrent modification")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    run_action(auth, pool.get_ref(), path.into_inner(), LeaveAction::Reject).await
}

/* =========================
Fetch one leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leaves WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match leave {
        Some(leave) => {
            // Staff read only their own requests; reviewers read any.
            if auth.role == Role::Staff && auth.staff_id != Some(leave.staff_id) {
                return Err(actix_web::error::ErrorForbidden("Not your leave request"));
            }
            Ok(HttpResponse::Ok().json(leave))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        }))),
    }
}

/* =========================
Leave list (filtered, paginated)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // Staff only ever see their own history, whatever filter they send.
    let staff_filter = if auth.role == Role::Staff {
        Some(auth.own_staff_id()?)
    } else {
        query.staff_id
    };

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(staff_id) = staff_filter {
        where_sql.push_str(" AND staff_id = ?");
        args.push(FilterValue::U64(staff_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(leave_type) = query.leave_type.as_deref() {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leaves{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT *
        FROM leaves
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Reviewer action queue
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/queue",
    responses(
        (status = 200, description = "Requests awaiting this reviewer", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Reviewers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_queue(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    // HODs review their own department; senior tiers see everything.
    let rows = if auth.role == Role::Hod {
        let staff_id = auth.own_staff_id()?;
        let department =
            sqlx::query_scalar::<_, String>("SELECT department FROM staffs WHERE id = ?")
                .bind(staff_id)
                .fetch_optional(pool.get_ref())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, staff_id, "Failed to fetch reviewer department");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?
                .ok_or_else(|| actix_web::error::ErrorForbidden("No staff profile"))?;

        sqlx::query_as::<_, LeaveRequest>(
            r#"
            SELECT l.*
            FROM leaves l
            JOIN staffs s ON s.id = l.staff_id
            WHERE s.department = ?
            AND l.status IN ('Pending', 'Recommended')
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(department)
        .fetch_all(pool.get_ref())
        .await
    } else {
        sqlx::query_as::<_, LeaveRequest>(
            r#"
            SELECT *
            FROM leaves
            WHERE status IN ('Pending', 'Recommended')
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool.get_ref())
        .await
    }
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch review queue");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Requests recommended at a non-matching stage are filtered out, not
    // reported as errors.
    let queue: Vec<LeaveRequest> = rows
        .into_iter()
        .filter(|leave| {
            let Ok(leave_type) = leave.leave_type.parse::<LeaveType>() else {
                tracing::warn!(leave_id = leave.id, leave_type = %leave.leave_type, "Skipping row with unrecognized leave type");
                return false;
            };
            let Some(state) = parse_state(&leave.status, leave.recommended_by.as_deref()) else {
                tracing::warn!(leave_id = leave.id, status = %leave.status, "Skipping row with unrecognized status");
                return false;
            };
            workflow::is_actionable(leave_type, state, auth.role)
        })
        .collect();

    Ok(HttpResponse::Ok().json(queue))
}

/* =========================
Leave balance
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Remaining balance per leave type", body = [LeaveBalance]),
        (status = 400, description = "Unknown leave type"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    // Staff query only their own balance.
    let staff_id = if auth.role == Role::Staff {
        auth.own_staff_id()?
    } else {
        match query.staff_id {
            Some(id) => id,
            None => auth.own_staff_id()?,
        }
    };

    let year = query.year.unwrap_or_else(|| Utc::now().year());

    match query.leave_type.as_deref() {
        Some(type_text) => {
            let leave_type = match type_text.parse::<LeaveType>() {
                Ok(t) => t,
                Err(_) => {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": format!("Unknown leave type '{type_text}'")
                    })));
                }
            };
            let balance = balance::remaining_balance(pool.get_ref(), staff_id, leave_type, year)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, staff_id, "Failed to compute leave balance");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;
            Ok(HttpResponse::Ok().json(balance))
        }
        None => {
            let summary = balance::balance_summary(pool.get_ref(), staff_id, year)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, staff_id, "Failed to compute balance summary");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;
            Ok(HttpResponse::Ok().json(summary))
        }
    }
}
