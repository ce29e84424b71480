//! VK account linked to a user.

use std::fmt;

use uuid::Uuid;

use crate::event::DomainEvent;

/// Local identifier of a linked VK account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VkUserId(Uuid);

impl VkUserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VkUserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for VkUserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for VkUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User id as known by VK.
///
/// Any string is accepted, including an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VkInternalUserId(String);

impl VkInternalUserId {
    pub fn create(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VkInternalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External identity from the VK OAuth provider. Immutable once created.
#[derive(Debug, Clone)]
pub struct VkUser {
    id: VkUserId,
    internal_id: VkInternalUserId,
    events: Vec<DomainEvent>,
}

impl VkUser {
    /// Create a new identity with a fresh local id.
    pub fn create(internal_id: VkInternalUserId) -> Self {
        let id = VkUserId::new();
        let events = vec![
            DomainEvent::VkUserCreated { vk_user_id: id },
            DomainEvent::VkUserInternalIdChanged {
                vk_user_id: id,
                internal_id: internal_id.clone(),
            },
        ];

        Self {
            id,
            internal_id,
            events,
        }
    }

    /// Rebuild a persisted identity. Records no event.
    pub fn restore(id: VkUserId, internal_id: VkInternalUserId) -> Self {
        Self {
            id,
            internal_id,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> VkUserId {
        self.id
    }

    #[inline]
    pub fn internal_id(&self) -> &VkInternalUserId {
        &self.internal_id
    }

    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl PartialEq for VkUser {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.internal_id == other.internal_id
    }
}

impl Eq for VkUser {}
