//! Probabilistic set of every driver name ever registered. A miss means the
//! name is certainly free; a hit still has to be confirmed.

use std::sync::{PoisonError, RwLock};

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

/// A fleet is small; the filter grows past this on its own if needed.
const FILTER_CAPACITY: usize = 1_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static DRIVER_NAME_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Names compare case-insensitively, like the `drivers.name` unique index.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// False positives possible, false negatives not.
pub fn might_exist(name: &str) -> bool {
    DRIVER_NAME_FILTER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(&normalize(name))
}

pub fn insert(name: &str) {
    DRIVER_NAME_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add(&normalize(name));
}

/// Used when a driver is renamed.
pub fn remove(name: &str) {
    DRIVER_NAME_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&normalize(name));
}

/// Streams every driver name into the filter in batches.
pub async fn warmup_driver_name_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT name FROM drivers").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (name,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&name));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Driver name filter warmup complete: {} drivers", total);
    Ok(())
}

fn insert_batch(names: &[String]) {
    let mut filter = DRIVER_NAME_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    for name in names {
        filter.add(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_names_match_case_insensitively() {
        insert("Filter Test Driver");
        assert!(might_exist("filter test driver"));
        assert!(might_exist("  FILTER TEST DRIVER "));
    }

    #[test]
    fn removed_name_is_forgotten() {
        insert("Renamed Filter Driver");
        remove("renamed filter driver");
        assert!(!might_exist("Renamed Filter Driver"));
    }
}
