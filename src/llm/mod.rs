pub mod api;
#[cfg(feature = "remote")]
pub mod client;
pub mod prompts;
pub mod types;

pub use api::*;
#[cfg(feature = "remote")]
pub use client::*;
pub use types::*;
