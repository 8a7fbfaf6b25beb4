// 🩺 Attention Queue - first come, first served
//
// Holds animal ids rather than references: the animal registry may be replaced
// wholesale (snapshot load) while animals wait, and an id either still
// resolves or surfaces as a NotFound error at attend time.
//
// unqueued --enqueue--> queued --dequeue--> attended

use std::collections::VecDeque;

use uuid::Uuid;

use crate::entities::Animal;

#[derive(Debug, Clone, Default)]
pub struct AttentionQueue {
    waiting: VecDeque<Uuid>,
}

impl AttentionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. Unbounded, so this always succeeds; duplicates are
    /// allowed here; `AnimalRegistry::enqueue_for_appointment` is the caller
    /// that refuses them.
    pub fn enqueue(&mut self, animal: &Animal) -> bool {
        self.enqueue_id(animal.id())
    }

    pub fn enqueue_id(&mut self, animal_id: Uuid) -> bool {
        self.waiting.push_back(animal_id);
        true
    }

    /// Remove and return the head; `None` on an empty queue
    pub fn dequeue(&mut self) -> Option<Uuid> {
        self.waiting.pop_front()
    }

    pub fn peek(&self) -> Option<Uuid> {
        self.waiting.front().copied()
    }

    pub fn size(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn contains(&self, animal: &Animal) -> bool {
        self.contains_id(animal.id())
    }

    pub fn contains_id(&self, animal_id: Uuid) -> bool {
        self.waiting.contains(&animal_id)
    }

    /// Waiting ids, head first
    pub fn iter(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.waiting.iter().copied()
    }
}

// ============================================================================
// TESTS
// ============================================================================
