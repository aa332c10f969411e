pub mod csv;
pub mod fetch;

pub use csv::{load_export, load_export_file, CsvError};
pub use fetch::{download_export, BlobLocation, FetchError};
