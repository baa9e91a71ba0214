//! Rust SDK for session-replay
//!
//! Record what a user does in your UI, upload it as a session, and fetch or
//! replay it later.
//!
//! # Recording
//!
//! ```rust
//! use session_replay_sdk::Recorder;
//!
//! let recorder = Recorder::new();
//! recorder.start();
//! recorder.log("screen_view", "Shop");
//! recorder.log("add_to_cart", "Product");
//! let recording = recorder.stop();
//! assert_eq!(recording.events.len(), 2);
//! ```
//!
//! # HTTP Client (default feature)
//!
//! ```rust,no_run
//! use session_replay_sdk::{Client, Recorder};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:5000")?;
//!
//!     let recorder = Recorder::new();
//!     recorder.start();
//!     recorder.log("tap", "Login");
//!     let created = client.sessions().upload(&recorder.stop()).await?;
//!
//!     let recording = client.sessions().fetch(&created.session_id).await?;
//!     session_replay_sdk::replay(&recording, Duration::from_millis(500), |event| {
//!         println!("{} on {}", event.kind, event.screen);
//!     })
//!     .await;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod recorder;
pub mod types;

#[cfg(feature = "http-client")]
pub mod client;

// Re-exports
pub use error::Error;
pub use recorder::{Recorder, replay};
pub use types::*;

#[cfg(feature = "http-client")]
pub use client::Client;
