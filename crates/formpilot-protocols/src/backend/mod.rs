//! Model backend protocol definitions.
//!
//! Backends turn a prompt into answer text. The remote backend talks to a
//! local inference server; the local backend runs a model in-process.

mod config;
mod request;
mod traits;

pub use config::*;
pub use request::*;
pub use traits::*;
