// Wire contract between peers: newline-delimited JSON messages over TCP.

pub mod messages;

pub use messages::Message;
