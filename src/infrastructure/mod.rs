pub mod config;
pub mod error;
pub mod kv_store;
pub mod logging;
pub mod notifier;
pub mod storage;
pub mod task_store;
