pub mod client;

pub use client::{IntroHaterClient, DEFAULT_BASE_URL};
