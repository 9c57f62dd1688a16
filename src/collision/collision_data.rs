use glam::Vec3;

use crate::{
    config::{DEFAULT_FRICTION, DEFAULT_MAX_CONTACTS, DEFAULT_RESTITUTION},
    dynamics::contact::Contact,
    utils::allocator::BodyId,
};

/// Capacity-bounded contact buffer filled by the narrow phase.
///
/// Every generated contact receives the buffer's friction and restitution.
#[derive(Debug, Clone)]
pub struct CollisionData {
    contacts: Vec<Contact>,
    max_contacts: usize,
    overflowed: bool,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for CollisionData {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTACTS)
    }
}

impl CollisionData {
    pub fn new(max_contacts: usize) -> Self {
        Self {
            contacts: Vec::with_capacity(max_contacts),
            max_contacts,
            overflowed: false,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
        }
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    /// Empties the buffer, keeping its capacity.
    pub fn reset(&mut self) {
        self.contacts.clear();
        self.overflowed = false;
    }

    pub fn set_max_contacts(&mut self, max_contacts: usize) {
        self.max_contacts = max_contacts;
        self.contacts.truncate(max_contacts);
    }

    pub fn max_contacts(&self) -> usize {
        self.max_contacts
    }

    pub fn has_more_contacts(&self) -> bool {
        self.contacts.len() < self.max_contacts
    }

    /// A contact was rejected for lack of room since the last reset.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn contacts_left(&self) -> usize {
        self.max_contacts.saturating_sub(self.contacts.len())
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }

    /// Stores a contact using the buffer's material. Returns `false` (and
    /// drops the contact) once the buffer is full.
    pub fn add_contact(
        &mut self,
        first: Option<BodyId>,
        second: Option<BodyId>,
        point: Vec3,
        normal: Vec3,
        penetration: f32,
    ) -> bool {
        let contact = Contact::new(first, second, point, normal, penetration)
            .with_material(self.friction, self.restitution);
        self.push(contact)
    }

    /// Stores a fully specified contact. Returns `false` and records the
    /// overflow when full.
    pub fn push(&mut self, contact: Contact) -> bool {
        if !self.has_more_contacts() {
            self.overflowed = true;
            return false;
        }
        self.contacts.push(contact);
        true
    }
}
