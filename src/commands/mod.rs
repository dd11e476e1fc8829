pub mod db;
pub mod report;
pub mod settings;
pub mod source;
