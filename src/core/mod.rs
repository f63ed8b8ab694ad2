//! Core module for message-based state ownership
//!
//! A minimal actor system: one task owns a piece of state and processes
//! notification messages against it in arrival order.

pub mod actor;
pub mod message;

// Re-exports for convenience
pub use actor::{Actor, ActorController, ActorSendError};
pub use message::{Message, MessageHandler};
