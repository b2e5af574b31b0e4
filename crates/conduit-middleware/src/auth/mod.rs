//! Credentials: the bypass set, the token codec and their errors.

mod bypass;
mod error;
mod token;

pub use bypass::BypassSet;
pub use error::AuthError;
pub use token::{Claims, TokenCodec};
