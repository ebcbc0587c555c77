//! Per-body contact records with enter/stay/exit diffing.
//!
//! Contacts are value types recreated every tick. The tracker keeps two
//! fixed-capacity generations and swaps them by flipping an index, so a
//! tick never mutates the previous tick's record and no allocation happens
//! in steady state.

use glam::Vec2;

/// Contacts beyond this count are silently dropped for the tick; a touching
/// body is re-probed next tick, so the loss is transient.
pub const MAX_CONTACTS: usize = 8;

/// A point-in-time touch between two bodies.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub other: hecs::Entity,
    /// Index into the other body's collider set.
    pub other_shape: usize,
    pub point: Vec2,
    pub normal: Vec2,
    /// Cardinal probe direction the touch was found along.
    pub approach: Vec2,
    pub relative_velocity: Vec2,
    /// True when there is tangential relative motion at the touch.
    pub sliding: bool,
}

impl Contact {
    /// Identity for diffing: same body, same shape, same approach
    /// direction. Position is deliberately excluded; a body sliding along
    /// a surface keeps one logical touch and must not re-enter.
    #[inline]
    pub fn same_touch(&self, other: &Contact) -> bool {
        self.other == other.other
            && self.other_shape == other.other_shape
            && self.approach == other.approach
    }

    fn placeholder() -> Self {
        Self {
            other: hecs::Entity::DANGLING,
            other_shape: 0,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            approach: Vec2::ZERO,
            relative_velocity: Vec2::ZERO,
            sliding: false,
        }
    }
}

/// Phase of a contact relative to the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Stay,
    Exit,
}

/// Double-buffered contact record for one body.
#[derive(Debug, Clone)]
pub struct ContactTracker {
    buffers: [[Contact; MAX_CONTACTS]; 2],
    lens: [usize; 2],
    current: usize,
}

impl Default for ContactTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactTracker {
    pub fn new() -> Self {
        Self {
            buffers: [[Contact::placeholder(); MAX_CONTACTS]; 2],
            lens: [0, 0],
            current: 0,
        }
    }

    /// Swap generations; the new current buffer starts empty.
    pub fn begin_tick(&mut self) {
        self.current ^= 1;
        self.lens[self.current] = 0;
    }

    /// Record a contact for the current tick. Dropped silently at capacity.
    pub fn push(&mut self, contact: Contact) {
        let len = self.lens[self.current];
        if len == MAX_CONTACTS {
            return;
        }
        self.buffers[self.current][len] = contact;
        self.lens[self.current] = len + 1;
    }

    pub fn current(&self) -> &[Contact] {
        &self.buffers[self.current][..self.lens[self.current]]
    }

    pub fn previous(&self) -> &[Contact] {
        let prev = self.current ^ 1;
        &self.buffers[prev][..self.lens[prev]]
    }

    /// Emit enter/stay/exit events by diffing current against previous.
    pub fn diff(&self, mut on_event: impl FnMut(ContactPhase, &Contact)) {
        for contact in self.current() {
            let phase = if self.previous().iter().any(|p| p.same_touch(contact)) {
                ContactPhase::Stay
            } else {
                ContactPhase::Enter
            };
            on_event(phase, contact);
        }
        for contact in self.previous() {
            if !self.current().iter().any(|c| c.same_touch(contact)) {
                on_event(ContactPhase::Exit, contact);
            }
        }
    }
}
