mod error;
mod message;
mod peer;

pub use error::{Error, Result};
pub use message::Message;
pub use peer::Peer;
