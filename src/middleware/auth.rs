use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::application::Actor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: String,
}

impl Claims {
    /// Converts the decoded token into an explicit caller identity. The
    /// Actor travels as a request extension and is passed by value into
    /// every lifecycle operation; nothing downstream reads the raw token.
    pub fn to_actor(&self) -> Option<Actor> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        match self.role.as_str() {
            "candidate" => Some(Actor::Candidate(id)),
            "company" => Some(Actor::Company(id)),
            _ => None,
        }
    }
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data.claims,
        Err(_) => return unauthorized("invalid_token"),
    };

    let Some(actor) = claims.to_actor() else {
        return unauthorized("unknown_role");
    };

    req.extensions_mut().insert(actor);
    next.run(req).await
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
}
