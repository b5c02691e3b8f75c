pub mod alerts;
pub mod cache;
pub mod user;
