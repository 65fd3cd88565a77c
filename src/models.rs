use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "john.doe@college.edu")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordReq {
    pub current_password: String,
    pub new_password: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // matches BIGINT UNSIGNED
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub staff_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this account is linked to a staff profile
    pub staff_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
