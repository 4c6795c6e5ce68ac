pub mod rules;
pub mod service;

pub use service::{Service, permission_table};
