/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::rc::Rc;

use crate::{
    common::types::*,
    domain::action::auth::{bearer_token, verify_token},
    tools::{error::AppError, prometheus::RATE_LIMITED_REQUESTS},
};
use actix::fut::{ready, Ready};
use actix_web::{
    body::BoxBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web::Data,
    Error, HttpMessage,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use shared::utils::logger::*;

/// Applies the sliding window rate limit of `AppState` per client ip.
pub struct RateLimit;

impl<S: 'static> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        Box::pin(async move {
            if let Some(rate_limiter) = req
                .app_data::<Data<AppState>>()
                .map(|data| data.rate_limiter.clone())
            {
                let client_ip = req
                    .peer_addr()
                    .map(|peer_addr| peer_addr.ip().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                if let Err(err) = rate_limiter
                    .check(&client_ip, Utc::now().timestamp())
                    .await
                {
                    RATE_LIMITED_REQUESTS.inc();
                    warn!(tag = "[Rate Limited]", client_ip = %client_ip, path = %req.path());
                    return Ok(req.error_response(err));
                }
            }

            svc.call(req).await
        })
    }
}

/// Requires a valid gateway token in the `Authorization: Bearer` header.
pub struct BearerAuth;

impl<S: 'static> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware { service }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: S,
}

impl<S> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match req.app_data::<Data<AppState>>() {
            Some(data) => bearer_token(
                req.headers()
                    .get(AUTHORIZATION)
                    .and_then(|authorization| authorization.to_str().ok()),
            )
            .and_then(|token| verify_token(&data.jwt_secret, token)),
            None => Err(AppError::InternalError(
                "Gateway state is not configured".to_string(),
            )),
        };

        match claims {
            Ok(claims) => {
                debug!(tag = "[Authorized]", user = %claims.user);
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(err) => {
                warn!(tag = "[Unauthorized]", path = %req.path(), reason = ?err);
                Box::pin(async move { Ok(req.error_response(err)) })
            }
        }
    }
}
