pub mod client;
pub mod events;
pub mod fanout;
pub mod registry;
pub mod server;

pub use client::{ClientHandle, ClientId};
pub use events::{BroadcastMessage, MessageSource};
pub use fanout::BroadcastEngine;
pub use registry::ClientRegistry;
