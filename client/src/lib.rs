//! # client
//!
//! Native host for the `canvas` interaction core. Owns the session token,
//! talks to the annotation service over HTTP, and runs the sync ops the core
//! emits, feeding each outcome back so optimistic changes are reconciled or
//! rolled back.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | API URL and session file location from the environment |
//! | [`session`] | File-backed bearer token |
//! | [`net`] | Typed REST client for the annotation and auth services |
//! | [`canvas_client`] | `CanvasClient`: core + session + executor |

pub mod canvas_client;
pub mod config;
pub mod net;
pub mod session;

pub use canvas_client::{CanvasClient, ClientError};
pub use config::ClientConfig;
pub use net::api::{ApiClient, ApiError};
pub use session::{Session, SessionError};

#[cfg(test)]
mod test_support;
