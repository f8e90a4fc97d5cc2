pub mod csv_source;
pub mod json_logs;

pub use csv_source::CsvSampleFetcher;
pub use json_logs::JsonLogFetcher;
