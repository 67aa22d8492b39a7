use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult, db_error, is_duplicate_key},
    model::driver::valid_commission,
    utils::{
        db_utils::{active_drivers, find_driver},
        driver_name_cache, driver_name_filter,
    },
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriver {
    #[serde(default)]
    #[schema(example = "Ramesh")]
    pub name: String,
    #[schema(example = 35.0)]
    pub commission_percentage: Option<f64>,
}

impl CreateDriver {
    fn validate(&self) -> Result<(String, f64), String> {
        let name = self.name.trim();
        let pct = match self.commission_percentage {
            Some(p) if !name.is_empty() => p,
            _ => return Err("Name and commission percentage are required".into()),
        };
        if !valid_commission(pct) {
            return Err("Commission percentage must be between 0 and 100".into());
        }
        Ok((name.to_string(), pct))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriver {
    pub name: Option<String>,
    pub commission_percentage: Option<f64>,
    pub is_active: Option<bool>,
}

impl UpdateDriver {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.commission_percentage.is_none() && self.is_active.is_none() {
            return Err("No fields provided for update".into());
        }
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err("Name cannot be empty".into());
        }
        if matches!(self.commission_percentage, Some(p) if !valid_commission(p)) {
            return Err("Commission percentage must be between 0 and 100".into());
        }
        Ok(())
    }
}

/// Filter miss means free, cache hit means taken, anything else asks MySQL.
async fn name_taken(pool: &MySqlPool, name: &str, except_id: Option<u64>) -> ApiResult<bool> {
    if !driver_name_filter::might_exist(name) {
        debug!("Driver name not in filter");
        return Ok(false);
    }
    if except_id.is_none() && driver_name_cache::is_taken(name).await {
        debug!("Driver name found in cache");
        return Ok(true);
    }

    let holder: Option<u64> = sqlx::query_scalar("SELECT id FROM drivers WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(db_error("Failed to check driver name"))?;

    Ok(matches!(holder, Some(id) if Some(id) != except_id))
}

fn name_conflict() -> ApiError {
    ApiError::Conflict("Driver with this name already exists".into())
}

/// Active drivers sorted by name.
#[utoipa::path(
    get,
    path = "/api/drivers",
    responses(
        (status = 200, description = "Active drivers", body = Object, example = json!({"drivers": []}))
    ),
    tag = "Drivers"
)]
#[instrument(skip(pool))]
pub async fn list_drivers(pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let drivers = active_drivers(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch drivers"))?;
    Ok(HttpResponse::Ok().json(json!({ "drivers": drivers })))
}

#[utoipa::path(
    post,
    path = "/api/drivers",
    request_body = CreateDriver,
    responses(
        (status = 201, description = "Driver created", body = Object),
        (status = 400, description = "Missing name or bad commission"),
        (status = 409, description = "Name already used")
    ),
    tag = "Drivers"
)]
#[instrument(skip(pool, payload))]
pub async fn create_driver(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDriver>,
) -> ApiResult<HttpResponse> {
    let (name, pct) = payload.validate().map_err(ApiError::BadRequest)?;

    if name_taken(pool.get_ref(), &name, None).await? {
        return Err(name_conflict());
    }

    let result = sqlx::query("INSERT INTO drivers (name, commission_percentage) VALUES (?, ?)")
        .bind(&name)
        .bind(pct)
        .execute(pool.get_ref())
        .await;

    let id = match result {
        Ok(r) => r.last_insert_id(),
        Err(e) if is_duplicate_key(&e) => return Err(name_conflict()),
        Err(e) => return Err(db_error("Failed to create driver")(e)),
    };

    driver_name_filter::insert(&name);
    driver_name_cache::mark_taken(&name).await;

    let driver = find_driver(pool.get_ref(), id)
        .await
        .map_err(db_error("Failed to create driver"))?
        .ok_or_else(|| ApiError::Internal("Failed to create driver".into()))?;

    info!(driver_id = id, "Driver created");
    Ok(HttpResponse::Created().json(json!({ "driver": driver })))
}

#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    params(("id" = u64, Path, description = "Driver id")),
    responses(
        (status = 200, description = "Driver", body = Driver),
        (status = 404, description = "Driver not found")
    ),
    tag = "Drivers"
)]
#[instrument(skip(pool))]
pub async fn get_driver(pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let driver = find_driver(pool.get_ref(), path.into_inner())
        .await
        .map_err(db_error("Failed to fetch driver"))?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;
    Ok(HttpResponse::Ok().json(json!({ "driver": driver })))
}

/// Rename, change commission or (de)activate. Drivers are never deleted.
#[utoipa::path(
    put,
    path = "/api/drivers/{id}",
    params(("id" = u64, Path, description = "Driver id")),
    request_body = UpdateDriver,
    responses(
        (status = 200, description = "Driver updated", body = Object),
        (status = 400, description = "Nothing to update or invalid value"),
        (status = 404, description = "Driver not found"),
        (status = 409, description = "Name already used")
    ),
    tag = "Drivers"
)]
#[instrument(skip(pool, payload))]
pub async fn update_driver(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateDriver>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    payload.validate().map_err(ApiError::BadRequest)?;

    let existing = find_driver(pool.get_ref(), id)
        .await
        .map_err(db_error("Failed to update driver"))?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;

    let new_name = payload.name.as_deref().map(str::trim);
    let renamed = new_name.filter(|n| *n != existing.name);
    if let Some(name) = renamed {
        if name_taken(pool.get_ref(), name, Some(id)).await? {
            return Err(name_conflict());
        }
    }

    let mut qb: QueryBuilder<MySql> = QueryBuilder::new("UPDATE drivers SET ");
    let mut set = qb.separated(", ");
    if let Some(name) = new_name {
        set.push("name = ").push_bind_unseparated(name.to_string());
    }
    if let Some(pct) = payload.commission_percentage {
        set.push("commission_percentage = ").push_bind_unseparated(pct);
    }
    if let Some(active) = payload.is_active {
        set.push("is_active = ").push_bind_unseparated(active);
    }
    qb.push(" WHERE id = ").push_bind(id);

    match qb.build().execute(pool.get_ref()).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key(&e) => return Err(name_conflict()),
        Err(e) => return Err(db_error("Failed to update driver")(e)),
    }

    if let Some(name) = renamed {
        driver_name_filter::remove(&existing.name);
        driver_name_cache::release(&existing.name).await;
        driver_name_filter::insert(name);
        driver_name_cache::mark_taken(name).await;
    }

    let driver = find_driver(pool.get_ref(), id)
        .await
        .map_err(db_error("Failed to update driver"))?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;

    info!(driver_id = id, "Driver updated");
    Ok(HttpResponse::Ok().json(json!({ "driver": driver })))
}
