//! Types shared by the bearer-auth workspace members

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
