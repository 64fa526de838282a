pub mod handlers;
pub mod install;
pub mod middleware;
pub mod programs;
pub mod routes;
pub mod settings;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
