use crate::config::Config;
use crate::model::role::Role;
use crate::models::Claims;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,

    /// Present only if this account is linked to a staff profile
    pub staff_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            role,
            staff_id: data.claims.staff_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// HOD, Director, Principal or Admin: anyone with a review queue.
    pub fn require_reviewer(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin || self.role.tier().is_some() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Reviewers only"))
        }
    }

    /// Roles allowed to register staff accounts.
    pub fn require_registrar(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Director | Role::Principal) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin/Director/Principal only"))
        }
    }

    /// The staff profile this caller submits leave against.
    pub fn own_staff_id(&self) -> actix_web::Result<u64> {
        self.staff_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No staff profile"))
    }
}
