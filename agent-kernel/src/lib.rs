//! Agent host that consumes capabilities.
//!
//! A [`CapabilityHost`] receives the ordered capability set once, then turns
//! each user input into model requests, running requested capabilities through
//! the [`InvocationScheduler`] until the model replies with plain text.

#![warn(missing_docs, clippy::pedantic)]

mod host;
mod scheduler;

pub use host::{
    CapabilityHost, ConversationHost, HostError, HostResult, ToolCallResult, TurnOutcome,
};
pub use scheduler::{InvocationScheduler, SchedulerConfig, SchedulerError, SchedulerResult};
