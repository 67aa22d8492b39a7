use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};

use crate::{
    error::{ApiResult, db_error},
    model::driver::{DEFAULT_DRIVERS, Driver},
    utils::{driver_name_cache, driver_name_filter},
};

/// Seeds the default roster into an empty database. Safe to call repeatedly.
#[utoipa::path(
    post,
    path = "/api/init",
    responses(
        (status = 201, description = "Default drivers created", body = Object, example = json!({
            "message": "Fleet management system initialized successfully", "drivers": [], "driversCount": 4
        })),
        (status = 200, description = "Drivers already present", body = Object, example = json!({
            "message": "Drivers already initialized", "count": 4
        }))
    ),
    tag = "Drivers"
)]
#[instrument(skip(pool))]
pub async fn init_system(pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let failed = || db_error("Failed to initialize system");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drivers")
        .fetch_one(pool.get_ref())
        .await
        .map_err(failed())?;

    if existing > 0 {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "Drivers already initialized",
            "count": existing,
        })));
    }

    let mut tx = pool.begin().await.map_err(failed())?;
    for (name, pct) in DEFAULT_DRIVERS {
        sqlx::query("INSERT INTO drivers (name, commission_percentage) VALUES (?, ?)")
            .bind(name)
            .bind(pct)
            .execute(&mut *tx)
            .await
            .map_err(failed())?;
    }
    sqlx::query("INSERT IGNORE INTO cash_balance (id, current_balance) VALUES (1, 0)")
        .execute(&mut *tx)
        .await
        .map_err(failed())?;
    tx.commit().await.map_err(failed())?;

    let drivers = sqlx::query_as::<_, Driver>("SELECT * FROM drivers ORDER BY id")
        .fetch_all(pool.get_ref())
        .await
        .map_err(failed())?;

    for driver in &drivers {
        driver_name_filter::insert(&driver.name);
        driver_name_cache::mark_taken(&driver.name).await;
    }

    info!(count = drivers.len(), "Default drivers created");
    Ok(HttpResponse::Created().json(json!({
        "message": "Fleet management system initialized successfully",
        "driversCount": drivers.len(),
        "drivers": drivers,
    })))
}
