use crate::{
    api::{analytics, cashier, dashboard, driver, health, init, monthly_salary, salary_payment, trip},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::ApiError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{error, middleware::from_fn, web};
use std::sync::Arc;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    // `finish` only fails on a zero period or burst, both clamped above.
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Malformed JSON, query strings and path segments become `{"error": ...}`.
fn extractor_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| error::Error::from(ApiError::bad_request(err.to_string()))),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| error::Error::from(ApiError::bad_request(err.to_string()))),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| error::Error::from(ApiError::bad_request(err.to_string()))),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    extractor_errors(cfg);

    // Public routes
    cfg.route("/health", web::get().to(health::health));
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/drivers")
                    // /drivers
                    .service(
                        web::resource("")
                            .route(web::get().to(driver::list_drivers))
                            .route(web::post().to(driver::create_driver)),
                    )
                    // /drivers/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(driver::get_driver))
                            .route(web::put().to(driver::update_driver)),
                    ),
            )
            .service(
                web::scope("/trips")
                    .service(
                        web::resource("")
                            .route(web::get().to(trip::list_trips))
                            .route(web::post().to(trip::create_trip)),
                    )
                    // registered before /{id} so "preview" is not taken as an id
                    .service(web::resource("/preview").route(web::post().to(trip::preview_trip)))
                    .service(web::resource("/{id}").route(web::get().to(trip::get_trip))),
            )
            .service(
                web::resource("/salary-payments")
                    .route(web::get().to(salary_payment::list_payments))
                    .route(web::post().to(salary_payment::create_payment)),
            )
            .service(
                web::resource("/cashier")
                    .route(web::get().to(cashier::list_transactions))
                    .route(web::post().to(cashier::create_transaction)),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(
                web::resource("/monthly-salary")
                    .route(web::get().to(monthly_salary::monthly_salary))
                    .route(web::post().to(monthly_salary::list_summaries)),
            )
            .service(web::resource("/init").route(web::post().to(init::init_system)))
            // Owner-only
            .service(
                web::resource("/business-analytics")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(analytics::business_analytics)),
            )
            .service(
                web::resource("/owner-dashboard")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(analytics::owner_dashboard)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::lazy_pool;
    use actix_web::{App, http::StatusCode, test};

    macro_rules! routed_app {
        () => {{
            let config = Config::for_tests();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(config.clone()))
                    .configure(|cfg| configure(cfg, config.clone())),
            )
            .await
        }};
    }

    /// The limiter keys on the peer address.
    fn from_peer(req: test::TestRequest) -> test::TestRequest {
        req.peer_addr("127.0.0.1:40000".parse().unwrap())
    }

    #[actix_web::test]
    async fn owner_routes_require_a_token() {
        let app = routed_app!();
        let req = from_peer(test::TestRequest::get().uri("/api/owner-dashboard?period=week")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn malformed_json_is_reported_as_error_body() {
        let app = routed_app!();
        let req = from_peer(
            test::TestRequest::post()
                .uri("/api/drivers")
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json"),
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn bad_page_size_is_rejected() {
        let app = routed_app!();
        let req = from_peer(test::TestRequest::get().uri("/api/trips?limit=500")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
