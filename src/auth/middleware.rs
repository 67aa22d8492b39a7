use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

use crate::auth::{jwt::verify_token, session::OwnerSession};
use crate::config::Config;

fn unauthorized(req: ServiceRequest, body: serde_json::Value) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

/// Owner gate for the analytics endpoints: requires `Authorization: Bearer`
/// with a token from `POST /auth/login`.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v,
            Err(_) => {
                return Ok(unauthorized(
                    req,
                    json!({"error": "Invalid Authorization header encoding"}),
                ));
            }
        },
        None => return Ok(unauthorized(req, json!({"error": "Missing Authorization header"}))),
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            return Ok(unauthorized(
                req,
                json!({"error": "Authorization header must start with Bearer"}),
            ));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::info!(error = %e, "Rejected owner token");
            return Ok(unauthorized(
                req,
                json!({"error": "Invalid or expired token", "details": e}),
            ));
        }
    };

    req.extensions_mut().insert(OwnerSession {
        token_id: claims.jti,
        expires_at: claims.exp,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::{App, HttpResponse, http::StatusCode, middleware::from_fn, test, web};

    async fn owner_only(session: OwnerSession) -> HttpResponse {
        HttpResponse::Ok().body(session.token_id)
    }

    fn config() -> Config {
        Config {
            jwt_secret: "gate-secret".into(),
            ..Config::for_tests()
        }
    }

    macro_rules! gated_app {
        () => {
            test::init_service(
                App::new().app_data(Data::new(config())).service(
                    web::resource("/owner")
                        .wrap(from_fn(auth_middleware))
                        .route(web::get().to(owner_only)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = gated_app!();
        let resp = test::call_service(&app, test::TestRequest::get().uri("/owner").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing Authorization header");
    }

    #[actix_web::test]
    async fn non_bearer_header_is_unauthorized() {
        let app = gated_app!();
        let req = test::TestRequest::get()
            .uri("/owner")
            .insert_header(("Authorization", "Basic b3duZXI6cGFzcw=="))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn token_signed_elsewhere_is_unauthorized() {
        let app = gated_app!();
        let (token, _) = generate_access_token("another-secret", 600).unwrap();
        let req = test::TestRequest::get()
            .uri("/owner")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[actix_web::test]
    async fn valid_token_reaches_handler_with_session() {
        let app = gated_app!();
        let (token, claims) = generate_access_token("gate-secret", 600).unwrap();
        let req = test::TestRequest::get()
            .uri("/owner")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, claims.jti.as_bytes());
    }

    #[actix_web::test]
    async fn session_extractor_without_gate_is_unauthorized() {
        let app = test::init_service(
            App::new().route("/open", web::get().to(owner_only)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/open").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
