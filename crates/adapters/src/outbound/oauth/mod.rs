//! OAuth provider clients.

mod vk;

pub use vk::VkOAuthClient;
