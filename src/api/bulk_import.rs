use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::leave::import::{self, BulkLeaveRow, ImportReport};
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::{error, info};

/// Bulk leave import. Rows come pre-extracted from a spreadsheet by the
/// caller; every field is re-validated here. Individual bad rows are
/// reported and skipped; only a failure to load the staff directory aborts
/// the run as a whole.
#[utoipa::path(
    post,
    path = "/api/v1/leave/bulk",
    request_body = [BulkLeaveRow],
    responses(
        (status = 200, description = "Import finished; per-row outcomes in the report", body = ImportReport),
        (status = 400, description = "Empty upload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Staff directory fetch or batched write failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn bulk_import(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    rows: web::Json<Vec<BulkLeaveRow>>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if rows.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No rows found in the upload"
        })));
    }

    // Shared precondition: the whole run needs the email -> staff mapping.
    // If this fails nothing has been written yet, so fail the run outright.
    let directory: HashMap<String, u64> =
        sqlx::query_as::<_, (u64, String)>("SELECT id, email FROM staffs")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch staff directory, aborting import");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?
            .into_iter()
            .map(|(id, email)| (email.to_lowercase(), id))
            .collect();

    let (staged, errors) = import::validate_rows(&rows, &directory);

    info!(
        total = rows.len(),
        staged = staged.len(),
        rejected = errors.len(),
        "Bulk import validated"
    );

    let success_count = import::persist_staged(pool.get_ref(), &staged, config.bulk_batch_size)
        .await
        .map_err(|e| {
            error!(error = %e, "Batched leave insert failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    info!(success_count, rejected = errors.len(), "Bulk import finished");

    Ok(HttpResponse::Ok().json(ImportReport {
        success_count,
        errors,
    }))
}
