//! Gateway core: dispatch pipeline, HTTP surface, server shell.

mod dispatch;
mod router;
mod server;

pub use dispatch::Dispatcher;
pub use router::{AppState, TARGET_HEADER, create_router};
pub use server::Gateway;
