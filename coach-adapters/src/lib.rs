//! Model and service adapters used by the coach.
//!
//! Each module exposes implementations for a specific provider while sharing
//! the trait-based interfaces defined in [`traits`] and [`services`].

#![warn(missing_docs, clippy::pedantic)]

pub mod anthropic;
pub mod intervals;
pub mod memory;
pub mod notion;
pub mod services;
pub mod telegram;
pub mod traits;

mod http_client;
