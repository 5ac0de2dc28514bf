pub mod config_loader;
pub mod image_import;
pub mod import_error;
pub mod import_runner;
pub mod logo;
pub mod ranking;
pub mod site_store;
pub mod tabular_import;
pub mod target_eval;
pub mod vision_client;
