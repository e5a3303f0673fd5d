//! # Netprompt
//!
//! Async interactive-shell session core for network device CLIs.
//!
//! Netprompt opens an interactive shell on a device, learns its prompt from
//! the shell itself, and runs commands by reading until the prompt (or a
//! caller-supplied pattern) comes back, dismissing `--More--` style
//! pagination on the way.
//!
//! ## Features
//!
//! - Async SSH shells via russh
//! - Prompt discovery with no per-device configuration
//! - Anchored completion matching on the newest output chunk only
//! - Partial output on timeout instead of an error
//! - Vendor platform registry (generic, Datacom DmOS)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netprompt::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netprompt::Error> {
//!     let mut session = SessionBuilder::new("192.0.2.10")
//!         .username("admin")
//!         .password("secret")
//!         .platform("datacom_os")
//!         .connect()
//!         .await?;
//!
//!     let response = session.send("show firmware\n").await?;
//!     println!("{}", response.raw);
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod platform;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use error::Error;
pub use platform::{PlatformDefinition, PlatformRegistry};
pub use session::{Command, CommandResponse, Session, SessionBuilder, SessionState};
pub use transport::{Protocol, SessionConfig, SessionOptions};
