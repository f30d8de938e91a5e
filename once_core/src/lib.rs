//! One-shot file sharing over HTTP.
//!
//! Serves a single file behind an unguessable URL and shuts the server down
//! after the first download or when the deadline passes, whichever is first.

pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod metadata;
pub mod net;
pub mod presentation;
pub mod session;
pub mod signal;
pub mod token;

pub use config::ServeConfig;
pub use error::StartupError;
pub use handler::{OneShotHandler, Route, router};
pub use lifecycle::{LifecycleState, RunningServer, ShutdownReport, serve_file, start};
pub use metadata::FileDescriptor;
pub use session::ServingSession;
pub use signal::{CompletionReason, CompletionSignal};
pub use token::{AccessToken, generate_access_token};
