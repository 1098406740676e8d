//! dnsfun server runtime: UDP listener + signal control channel + snapshot
//! loop + background refreshers.

pub mod control;
mod error;
pub mod listener;
mod runtime;
pub mod sweeper;

pub use control::ControlMessage;
pub use error::ServerError;
pub use runtime::{assemble, init_tracing, run, serve, start_blocking, Server};
