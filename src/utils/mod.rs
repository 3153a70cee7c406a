pub mod today_cache;
