use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::error::ApiError;

/// Proof that the request passed the owner gate. Inserted by
/// `auth_middleware`; handlers behind the gate take it as an argument.
#[derive(Debug, Clone)]
pub struct OwnerSession {
    pub token_id: String,
    pub expires_at: usize,
}

impl FromRequest for OwnerSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<OwnerSession>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized("Owner authentication required".into())),
        )
    }
}
