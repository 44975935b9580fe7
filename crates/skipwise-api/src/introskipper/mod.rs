pub mod client;

pub use client::{IntroSkipperClient, DEFAULT_BASE_URL};
