//! fifo-greeter - greeting API backed by a FIFO queue.
//!
//! This library provides the modules used by the `fifo-greeter` binary:
//! - `web`: the HTTP router and handlers
//! - `queue`: the publish/subscribe seam with AMQP and in-memory backends
//! - `consumer`: the listener that logs every delivered payload
//!
//! ## Architecture
//!
//! ```text
//! POST /api/send-message → Publisher → FIFO queue → PayloadLogger → log line
//! ```

pub mod config;
pub mod consumer;
pub mod message;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::{Config, QueueBackend};
pub use consumer::PayloadLogger;
pub use message::Message;
pub use queue::{
    AmqpQueue, InMemoryQueue, Listener, MessageQueue, Publisher, QueueError, ReceivedMessage,
    Subscription, DEFAULT_QUEUE,
};
pub use web::{router, AppState};
