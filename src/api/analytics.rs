use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::IntoParams;

use crate::{
    auth::session::OwnerSession,
    config::Config,
    error::{ApiResult, db_error},
    finance::{
        analytics::business_metrics,
        owner::{OwnerInputs, owner_metrics},
        period::{AnalyticsPeriod, DateRange, OwnerPeriod},
    },
    model::cashier::CashierTransaction,
    utils::db_utils::{Filter, SqlValue, active_drivers, cash_balance, load_payments, load_trips},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Unknown values mean the whole history.
    pub period: Option<String>,
}

fn since(column: &'static str, from: chrono::NaiveDate) -> Filter {
    Filter::new().and(column, SqlValue::Date(from))
}

/// Owner analytics over a rolling window (`7d`, `30d`, `90d`, `all`).
#[utoipa::path(
    get,
    path = "/api/business-analytics",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Business metrics", body = Object, example = json!({
            "success": true, "metrics": {}, "period": "30d",
            "dateRange": {"from": "2026-02-12", "to": "2026-03-14"}
        })),
        (status = 401, description = "Owner token missing or invalid")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(pool, session), fields(jti = %session.token_id, exp = session.expires_at))]
pub async fn business_analytics(
    session: OwnerSession,
    pool: web::Data<MySqlPool>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let period = AnalyticsPeriod::parse(query.period.as_deref());
    let today = Local::now().date_naive();
    let from = period.start(today);

    let pool = pool.get_ref();
    let failed = || db_error("Failed to fetch analytics data");

    let drivers = active_drivers(pool).await.map_err(failed())?;
    let trips = load_trips(pool, &since("trip_date >= ", from))
        .await
        .map_err(failed())?;
    let payments = load_payments(pool, &since("payment_date >= ", from))
        .await
        .map_err(failed())?;
    let balance = cash_balance(pool).await.map_err(failed())?;

    let metrics = business_metrics(&drivers, &trips, &payments, balance);
    info!(%period, trips = trips.len(), "Business analytics computed");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "metrics": metrics,
        "period": period,
        "dateRange": DateRange { from, to: today },
    })))
}

/// Owner dashboard for `today`, `week`, `month` or `all`.
#[utoipa::path(
    get,
    path = "/api/owner-dashboard",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Owner metrics", body = Object, example = json!({
            "success": true, "metrics": {}, "period": "today",
            "dateRange": {"from": "2026-03-14", "to": "2026-03-14"}
        })),
        (status = 401, description = "Owner token missing or invalid")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(pool, config, session), fields(jti = %session.token_id, exp = session.expires_at))]
pub async fn owner_dashboard(
    session: OwnerSession,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let period = OwnerPeriod::parse(query.period.as_deref());
    let today = Local::now().date_naive();
    let from = period.start(today);

    let pool = pool.get_ref();
    let failed = || db_error("Failed to fetch owner dashboard data");

    let drivers = active_drivers(pool).await.map_err(failed())?;
    let trips = load_trips(pool, &since("trip_date >= ", from))
        .await
        .map_err(failed())?;
    let payments = load_payments(pool, &since("payment_date >= ", from))
        .await
        .map_err(failed())?;

    let mut qb = since("transaction_date >= ", from).select("*", "cashier_transactions");
    qb.push(" ORDER BY transaction_date DESC, created_at DESC, id DESC");
    let cashier = qb
        .build_query_as::<CashierTransaction>()
        .fetch_all(pool)
        .await
        .map_err(failed())?;

    let balance = cash_balance(pool).await.map_err(failed())?;

    let metrics = owner_metrics(&OwnerInputs {
        drivers: &drivers,
        trips: &trips,
        payments: &payments,
        cashier: &cashier,
        cash_balance: balance,
        daily_target: config.daily_target,
    });
    info!(%period, trips = trips.len(), "Owner dashboard computed");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "metrics": metrics,
        "period": period,
        "dateRange": DateRange { from, to: today },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::lazy_pool;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn analytics_need_an_owner_session() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .route("/business-analytics", web::get().to(business_analytics))
                .route("/owner-dashboard", web::get().to(owner_dashboard)),
        )
        .await;

        for uri in ["/business-analytics?period=7d", "/owner-dashboard"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
