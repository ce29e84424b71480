//! Application layer: use cases orchestrating the domain through ports.

pub mod dto;
pub mod error;
pub mod ports;
pub mod usecases;
