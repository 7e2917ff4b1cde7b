pub mod download;
pub mod reset;
