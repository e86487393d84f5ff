//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Install metrics → Bind listener → Activate relay → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel open relay sessions → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, listener last
//! - Fail fast: any startup error is fatal
//! - Relay sessions are cancelled first, otherwise unbounded streams would
//!   hold the drain open forever

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
