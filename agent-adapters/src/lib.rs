//! Model and service adapters used by agents.
//!
//! [`traits`] defines the completion backend contract, [`openai`] implements
//! it over HTTPS, and [`observer`] wraps any backend with a chain of request
//! observers. [`http`] is the HTTPS client shared with tool providers.

#![warn(missing_docs, clippy::pedantic)]

pub mod http;
pub mod observer;
pub mod openai;
pub mod traits;
