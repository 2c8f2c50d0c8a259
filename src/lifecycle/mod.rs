//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown triggers:
//!     signals.rs  (SIGINT / SIGTERM)
//!     offline.rs  (app_offline.htm dropped next to the binary)
//!         → shutdown.rs broadcast
//!             → HTTP server stops accepting and drains
//!             → cooldown sweeper exits
//! ```

pub mod offline;
pub mod shutdown;
pub mod signals;

pub use offline::OfflineWatcher;
pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
