/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{
    common::types::*,
    tools::{error::AppError, prometheus::AUTH_TOKENS_ISSUED},
};
use actix_web::web::Data;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use shared::utils::logger::*;

const BEARER_PREFIX: &str = "Bearer ";

/// Signs an HS256 token for `user`, valid for `expiry` seconds from `issued_at`.
pub fn issue_token(
    secret: &str,
    user: &str,
    expiry: u32,
    issued_at: i64,
) -> Result<String, AppError> {
    let claims = Claims {
        user: user.to_string(),
        iat: issued_at,
        exp: issued_at + i64::from(expiry),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AppError::InternalError(format!("Failed to sign token : {err}")))
}

/// Checks signature, algorithm and expiry of `token`.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|token_data| token_data.claims)
    .map_err(|err| AppError::InvalidToken(err.to_string()))
}

/// Extracts the token of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AppError> {
    authorization
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingToken)
}

pub async fn login(data: Data<AppState>) -> Result<LoginResponse, AppError> {
    let token = issue_token(
        &data.jwt_secret,
        &data.auth_token_user,
        data.auth_token_expiry,
        Utc::now().timestamp(),
    )?;

    AUTH_TOKENS_ISSUED.inc();
    info!(tag = "[Token Issued]", user = %data.auth_token_user);

    Ok(LoginResponse { token })
}
