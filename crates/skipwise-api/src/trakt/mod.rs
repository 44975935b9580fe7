pub mod client;
pub mod types;

pub use client::{TraktClient, DEFAULT_BASE_URL};
