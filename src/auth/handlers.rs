use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    models::{ChangePasswordReq, LoginReqDto, TokenType, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

/// Login handler: email + password against the accounts table.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Tokens issued", body = Object, example = json!({
            "access_token": "...",
            "refresh_token": "..."
        })),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1. Basic validation
    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().body("Email or password required");
    }

    debug!("Fetching account from database");

    // 2. Fetch account (emails are stored lowercased)
    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, email, password, role_id, staff_id
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(user.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "Account found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: account not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching account");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3. Verify password
    debug!("Verifying password");

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    debug!("Password verified");

    // 4. Generate access token
    let access_token = match generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role_id,
        db_user.staff_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 5. Generate refresh token
    let (refresh_token, refresh_claims) = match generate_refresh_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role_id,
        db_user.staff_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "Failed to sign refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 6. Store refresh token
    debug!(
        user_id = db_user.id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(db_user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // 7. Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Rotate a refresh token and issue a new access token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair issued"),
        (status = 401, description = "Invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // find refresh token in DB
    let record = match sqlx::query_as::<_, (u64, u64, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (record_id, record_user_id) = match record {
        Some((id, user_id, revoked)) if !revoked => (id, user_id),
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // revoke old refresh token
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // issue new refresh token
    let (new_refresh_token, new_claims) = match generate_refresh_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        claims.staff_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "Failed to sign refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(record_user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store rotated refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // new access token
    let access_token = match generate_access_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        claims.staff_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

/// Revoke the presented refresh token. Succeeds even if it never existed.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    // 1. extract Authorization header
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    // 2. verify JWT
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // 3. only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // 4. revoke refresh token (idempotent)
    let _ = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = 1
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await;

    // 5. success (even if token didn't exist)
    HttpResponse::NoContent().finish()
}

/// Change the caller's own password after re-verifying the current one.
#[utoipa::path(
    put,
    path = "/api/v1/account/password",
    request_body = ChangePasswordReq,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "New password rejected"),
        (status = 401, description = "Current password mismatch")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ChangePasswordReq>,
) -> actix_web::Result<impl Responder> {
    if payload.new_password.len() < 6 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "New password must be at least 6 characters"
        })));
    }

    let current_hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = ?")
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to fetch account");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let current_hash = match current_hash {
        Some(h) => h,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Account not found"
            })));
        }
    };

    if verify_password(&payload.current_password, &current_hash).is_err() {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "Current password is incorrect"
        })));
    }

    let new_hash = hash_password(&payload.new_password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(new_hash)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to update password");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password updated successfully"
    })))
}
