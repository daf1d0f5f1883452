pub mod export_service;
pub mod import_service;

pub use export_service::ExportService;
pub use import_service::ImportService;
