use std::future::{Ready, ready};

use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::warn;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::database::RedisService;
use crate::utils::error::CustomError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: String,
    pub exp: usize,
}

/// Verify the bearer JWT and, when Redis is wired in, the session behind it
pub async fn verify_token(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let token = credentials.token();

    let Some(auth) = req.app_data::<web::Data<AuthConfig>>() else {
        warn!("AuthConfig missing from app data; rejecting request");
        return Err((
            CustomError::UnauthorizedError("Authentication is not configured".into()).into(),
            req,
        ));
    };

    let token_data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data,
        Err(_) => {
            return Err((
                CustomError::UnauthorizedError("Invalid token".into()).into(),
                req,
            ));
        }
    };

    let redis_service = match req.app_data::<web::Data<RedisService>>() {
        Some(service) => service.clone(),
        None => {
            // No session store configured, the JWT alone decides
            req.extensions_mut().insert(token_data.claims);
            return Ok(req);
        }
    };

    match redis_service.validate_session(token).await {
        Ok(Some(stored_user_id)) if stored_user_id == token_data.claims.id => {
            req.extensions_mut().insert(token_data.claims);
            Ok(req)
        }
        Ok(Some(_)) => Err((
            CustomError::UnauthorizedError("Session mismatch".into()).into(),
            req,
        )),
        Ok(None) => Err((
            CustomError::UnauthorizedError("Session expired or invalid".into()).into(),
            req,
        )),
        Err(e) => {
            warn!("Session store unavailable, falling back to JWT only: {}", e);
            req.extensions_mut().insert(token_data.claims);
            Ok(req)
        }
    }
}

/// Mint a 24 hour token for `user_id`. Production tokens come from the
/// identity provider; this is what tests and local tooling use.
pub fn create_token(user_id: &str, auth: &AuthConfig) -> Result<String, CustomError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(24))
        .ok_or_else(|| CustomError::InternalServerError("Invalid token expiry".into()))?
        .timestamp() as usize;

    let claims = Claims {
        id: user_id.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|_| CustomError::InternalServerError("Token generation failed".into()))
}

/// The authenticated principal of the current request.
///
/// Handlers take this as an argument; it is read from the claims that
/// `verify_token` leaves in the request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: ObjectId,
}

impl FromRequest for AuthUser {
    type Error = CustomError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<Claims>()
            .ok_or_else(|| CustomError::UnauthorizedError("Not authenticated".into()))
            .and_then(|claims| {
                ObjectId::parse_str(&claims.id)
                    .map(|id| AuthUser { id })
                    .map_err(|_| CustomError::UnauthorizedError("Invalid user id in token".into()))
            });
        ready(result)
    }
}
