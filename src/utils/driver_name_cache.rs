use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use super::driver_name_filter::normalize;

/// Names known to be taken. Only positives are stored.
pub static DRIVER_NAME_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(name: &str) {
    DRIVER_NAME_CACHE.insert(normalize(name), true).await;
}

pub async fn is_taken(name: &str) -> bool {
    DRIVER_NAME_CACHE
        .get(&normalize(name))
        .await
        .unwrap_or(false)
}

/// Forget a name after a rename frees it.
pub async fn release(name: &str) {
    DRIVER_NAME_CACHE.invalidate(&normalize(name)).await;
}

async fn batch_mark(names: &[String]) {
    let futures: Vec<_> = names
        .iter()
        .map(|n| DRIVER_NAME_CACHE.insert(normalize(n), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Loads the names of drivers touched in the last `days` days.
pub async fn warmup_driver_name_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT name
        FROM drivers
        WHERE updated_at >= NOW() - INTERVAL ? DAY
        ORDER BY updated_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (name,) = row?;
        batch.push(name);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Driver name cache warmup complete: {} recent drivers (last {} days)",
        total_count,
        days
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn marks_and_releases_names() {
        mark_taken("Cache Test Driver").await;
        assert!(is_taken("cache test driver").await);

        release("CACHE TEST DRIVER").await;
        assert!(!is_taken("Cache Test Driver").await);
    }

    #[actix_web::test]
    async fn unknown_name_is_not_taken() {
        assert!(!is_taken("Never Registered").await);
    }
}
