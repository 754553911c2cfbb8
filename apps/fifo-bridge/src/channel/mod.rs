//! External channel: a named pipe other processes write lines into.

pub mod provision;
pub mod reader;

pub use provision::{provision, Provisioned};
pub use reader::ChannelReader;
