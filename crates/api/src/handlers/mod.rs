pub mod admin;
pub mod progress;
