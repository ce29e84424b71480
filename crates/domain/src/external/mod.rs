//! External identity providers.

pub mod vk;
