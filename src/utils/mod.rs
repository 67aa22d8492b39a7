pub mod db_utils;
pub mod driver_name_cache;
pub mod driver_name_filter;
pub mod pagination;
