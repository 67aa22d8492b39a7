use actix_web::{HttpResponse, web};
use tracing::{debug, info, instrument};

use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::{ApiError, ApiResult},
    models::{LoginReqDto, LoginResponse},
};

/// Exchanges the owner password for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Owner token issued", body = LoginResponse),
        (status = 400, description = "Password missing"),
        (status = 401, description = "Wrong password")
    ),
    tag = "Auth"
)]
#[instrument(name = "owner_login", skip(config, body))]
pub async fn login(
    body: web::Json<LoginReqDto>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    if body.password.is_empty() {
        info!("Validation failed: empty password");
        return Err(ApiError::bad_request("Password is required"));
    }

    debug!("Verifying password");
    if let Err(e) = verify_password(&body.password, &config.owner_password_hash) {
        info!(error = %e, "Invalid credentials");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let (access_token, claims) = generate_access_token(&config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign owner token");
            ApiError::Internal("Failed to issue token".into())
        })?;

    info!(jti = %claims.jti, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: config.access_token_ttl,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_token;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;

    macro_rules! login_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Config::for_tests()))
                    .route("/auth/login", web::post().to(login)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn correct_password_yields_token() {
        let app = login_app!();
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"password": "owner-pass"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["tokenType"], "Bearer");
        assert_eq!(body["expiresIn"], 600);
        let token = body["accessToken"].as_str().unwrap();
        assert!(verify_token(token, "test-secret").is_ok());
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorized() {
        let app = login_app!();
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"password": "guess"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[actix_web::test]
    async fn empty_password_is_bad_request() {
        let app = login_app!();
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"password": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
