use crate::{
    auth::auth::AuthUser,
    auth::password::{INITIAL_PASSWORD, hash_password},
    model::role::Role,
    model::staff::{DEPARTMENTS, DESIGNATIONS, Staff, StaffStatus},
    utils::db_utils::{build_update_sql, execute_update},
    utils::email_cache,
    utils::email_filter,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStaff {
    #[schema(example = "John Doe")]
    pub display_name: String,
    #[schema(example = "Dr.")]
    pub salutation: Option<String>,
    #[schema(example = "john.doe@college.edu", format = "email")]
    pub email: String,
    #[schema(example = "Computer Science & Engineering")]
    pub department: String,
    #[schema(example = "Assistant Professor")]
    pub designation: String,
    #[schema(example = "Active")]
    pub status: Option<StaffStatus>,
    #[schema(example = "2020-06-01", format = "date", value_type = String)]
    pub date_of_joining: NaiveDate,
    #[schema(example = "APT-2020-042")]
    pub appointment_no: Option<String>,
    /// Portal role of the new account; defaults to staff.
    #[schema(example = "staff")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaffQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StaffListResponse {
    pub data: Vec<Staff>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Columns a profile edit may touch. Credentials and the owning id are not
/// editable through this endpoint.
const UPDATABLE_COLUMNS: &[&str] = &[
    "display_name",
    "salutation",
    "department",
    "designation",
    "status",
    "date_of_joining",
    "appointment_no",
];

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.to_lowercase();

    // 1. Cuckoo filter - fast negative: if the filter has never seen it,
    // it cannot be taken.
    if !email_filter::might_exist(&email) {
        return true;
    }

    // 2. Moka cache - fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // 3. Database fallback
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)")
            .bind(&email)
            .fetch_one(pool)
            .await
            .unwrap_or(true); // fail-safe

    !exists
}

/// Register Staff (account + profile)
#[utoipa::path(
    post,
    path = "/api/v1/staff",
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff member registered", body = Object, example = json!({
            "message": "Staff member registered successfully",
            "staff_id": 42
        })),
        (status = 400, description = "Invalid department, designation or role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn create_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStaff>,
) -> actix_web::Result<impl Responder> {
    auth.require_registrar()?;

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.display_name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name and email must not be empty"
        })));
    }

    if !DEPARTMENTS.contains(&payload.department.as_str()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Unknown department '{}'", payload.department)
        })));
    }

    if !DESIGNATIONS.contains(&payload.designation.as_str()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Unknown designation '{}'", payload.designation)
        })));
    }

    let role = match payload.role.as_deref() {
        None => Role::Staff,
        Some(r) => match Role::from_role_str(r) {
            // Admin accounts are provisioned out of band, never via the API.
            Some(Role::Admin) | None => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": format!("Invalid role '{r}'")
                })));
            }
            Some(role) => role,
        },
    };

    if !is_email_available(&email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Email already registered"
        })));
    }

    let status = payload.status.unwrap_or(StaffStatus::Active);
    let hashed = hash_password(INITIAL_PASSWORD).map_err(|e| {
        error!(error = %e, "Failed to hash initial password");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // Profile and account land together or not at all.
    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let staff_result = sqlx::query(
        r#"
        INSERT INTO staffs
        (display_name, salutation, email, department, designation, status, date_of_joining, appointment_no)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.display_name.trim())
    .bind(payload.salutation.as_deref())
    .bind(&email)
    .bind(&payload.department)
    .bind(&payload.designation)
    .bind(status.to_string())
    .bind(payload.date_of_joining)
    .bind(payload.appointment_no.as_deref())
    .execute(&mut *tx)
    .await;

    let staff_id = match staff_result {
        Ok(result) => result.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Email already registered"
                    })));
                }
            }
            error!(error = %e, "Failed to create staff profile");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    if let Err(e) = sqlx::query(
        r#"INSERT INTO users (email, password, role_id, staff_id) VALUES (?, ?, ?, ?)"#,
    )
    .bind(&email)
    .bind(&hashed)
    .bind(role as u8)
    .bind(staff_id)
    .execute(&mut *tx)
    .await
    {
        error!(error = %e, "Failed to create staff account");
        return Err(ErrorInternalServerError("Internal Server Error"));
    }

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit staff registration");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // Keep the fast-path structures in sync with the new account.
    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Staff member registered successfully",
        "staff_id": staff_id
    })))
}

// -------------------- List --------------------

#[utoipa::path(
    get,
    path = "/api/v1/staff",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("department", Query, description = "Filter by department"),
        ("status", Query, description = "Filter by status"),
        ("search", Query, description = "Search by name or email")
    ),
    responses(
        (status = 200, description = "Paginated staff list", body = StaffListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_staffs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StaffQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    // All staff filters bind as text, so a plain string vector does.
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(department.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(display_name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM staffs {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting staff");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count staff");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM staffs {} ORDER BY display_name ASC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching staff");

    let mut data_query = sqlx::query_as::<_, Staff>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let staffs = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch staff");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(StaffListResponse {
        data: staffs,
        page,
        per_page,
        total,
    }))
}

/// Update Staff profile
#[utoipa::path(
    put,
    path = "/api/v1/staff/{staff_id}",
    params(("staff_id", Path, description = "Staff ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Staff updated successfully"),
        (status = 400, description = "Unknown field in payload"),
        (status = 404, description = "Staff not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn update_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_registrar()?;

    let staff_id = path.into_inner();

    let update = build_update_sql("staffs", &body, UPDATABLE_COLUMNS, "id", staff_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Staff not found"));
    }

    Ok(HttpResponse::Ok().body("Staff updated successfully"))
}

/// Get Staff by ID
#[utoipa::path(
    get,
    path = "/api/v1/staff/{staff_id}",
    params(("staff_id", Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Staff found", body = Staff),
        (status = 404, description = "Staff not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn get_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let staff_id: u64 = path.into_inner();

    // Staff members may read their own profile; reviewers read any.
    if auth.role == Role::Staff && auth.staff_id != Some(staff_id) {
        return Err(actix_web::error::ErrorForbidden("Not your profile"));
    }

    let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staffs WHERE id = ?")
        .bind(staff_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, staff_id, "Failed to fetch staff");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match staff {
        Some(staff) => Ok(HttpResponse::Ok().json(staff)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Staff not found"
        }))),
    }
}
