pub mod json_file;
pub mod static_source;

pub use json_file::JsonFileSource;
pub use static_source::StaticSource;
