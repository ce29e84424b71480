//! Adapters implementing the application ports against the outside world.

pub mod outbound;
