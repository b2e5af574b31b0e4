//! The standard interceptors.
//!
//! | Order | Stage | Purpose |
//! |-------|-------|---------|
//! | 1 | [`Recovery`] | Panic to `INTERNAL` |
//! | 2 | [`AuthGate`] | Bypass set and bearer token verification |
//! | 3 | [`Logging`] | Outcome logs and request metrics |

pub mod auth_gate;
pub mod logging;
pub mod recovery;

pub use auth_gate::AuthGate;
pub use logging::{CallRecord, Logging};
pub use recovery::Recovery;
