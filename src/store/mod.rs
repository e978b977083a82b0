pub mod counts_log;
pub mod image_store;
