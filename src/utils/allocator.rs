use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Slot index paired with the generation it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GenerationalId {
    pub index: usize,
    pub generation: u32,
}

impl GenerationalId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Non-owning reference into an [`Arena`].
///
/// Bodies, BVH nodes, particles and colliders all refer to each other through
/// handles; a handle whose slot has been freed simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Handle(pub GenerationalId);

impl Handle {
    pub fn new(index: usize, generation: u32) -> Self {
        Self(GenerationalId::new(index, generation))
    }

    pub fn from_index(index: u32) -> Self {
        Self::new(index as usize, 0)
    }

    pub fn index(&self) -> usize {
        self.0.index
    }

    pub fn generation(&self) -> u32 {
        self.0.generation
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index(), self.generation())
    }
}

/// Typed id handed out by an [`Arena`]; a thin wrapper around [`Handle`].
pub trait ArenaId: Copy {
    fn from_handle(handle: Handle) -> Self;
    fn handle(self) -> Handle;
}

impl ArenaId for Handle {
    fn from_handle(handle: Handle) -> Self {
        handle
    }

    fn handle(self) -> Handle {
        self
    }
}

/// Ties a stored type to the id its arena hands out, so a [`NodeId`] can
/// never index the body arena.
pub trait ArenaItem {
    type Id: ArenaId;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(Handle);

        impl $name {
            pub fn new(index: usize, generation: u32) -> Self {
                Self(Handle::new(index, generation))
            }

            pub fn from_index(index: u32) -> Self {
                Self(Handle::from_index(index))
            }

            pub fn index(&self) -> usize {
                self.0.index()
            }

            pub fn generation(&self) -> u32 {
                self.0.generation()
            }
        }

        impl ArenaId for $name {
            fn from_handle(handle: Handle) -> Self {
                Self(handle)
            }

            fn handle(self) -> Handle {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

arena_id!(
    /// Id of a [`RigidBody`](crate::core::RigidBody).
    BodyId
);
arena_id!(
    /// Id of a node of a [`Bvh`](crate::collision::Bvh).
    NodeId
);
arena_id!(
    /// Id of a [`Particle`](crate::core::Particle).
    ParticleId
);
arena_id!(
    /// Id of a collider registered with the [`World`](crate::world::World).
    ColliderId
);

/// Generational arena that hands out stable handles while preventing use-after-free.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
            live: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: VecDeque::new(),
            live: 0,
        }
    }
}

impl<T: ArenaItem> Arena<T> {
    pub fn insert(&mut self, item: T) -> T::Id {
        self.live += 1;
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            self.items[index] = Some(item);
            return T::Id::from_handle(Handle::new(index, generation));
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        T::Id::from_handle(Handle::new(index, 0))
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        let id = id.handle();
        if self.live_slot(id) {
            self.items[id.index()].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        let id = id.handle();
        if self.live_slot(id) {
            self.items[id.index()].as_mut()
        } else {
            None
        }
    }

    /// Borrows two distinct live slots mutably at once, in argument order.
    pub fn get2_mut(&mut self, id_a: T::Id, id_b: T::Id) -> Option<(&mut T, &mut T)> {
        let (id_a, id_b) = (id_a.handle(), id_b.handle());
        if id_a.index() == id_b.index() || !self.live_slot(id_a) || !self.live_slot(id_b) {
            return None;
        }

        let (first, second, flipped) = if id_a.index() < id_b.index() {
            (id_a, id_b, false)
        } else {
            (id_b, id_a, true)
        };

        let (left, right) = self.items.split_at_mut(second.index());
        let first_slot = left[first.index()].as_mut()?;
        let second_slot = right[0].as_mut()?;

        if flipped {
            Some((second_slot, first_slot))
        } else {
            Some((first_slot, second_slot))
        }
    }

    /// Frees the slot; stale handles (wrong generation) are ignored.
    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let id = id.handle();
        if !self.live_slot(id) {
            return None;
        }
        let item = self.items[id.index()].take()?;
        self.generations[id.index()] = self.generations[id.index()].wrapping_add(1);
        self.free_list.push_back(id.index());
        self.live -= 1;
        Some(item)
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.items.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free_list.push_back(index);
            }
        }
        self.live = 0;
    }

    pub fn iter(&self) -> ArenaIter<'_, T> {
        ArenaIter {
            inner: self.items.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> ArenaIterMut<'_, T> {
        ArenaIterMut {
            inner: self.items.iter_mut(),
        }
    }

    /// Live entries together with their handles.
    pub fn entries(&self) -> impl Iterator<Item = (T::Id, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (T::Id::from_handle(Handle::new(index, self.generations[index])), item))
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.entries().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.live_slot(id.handle())
    }

    fn live_slot(&self, id: Handle) -> bool {
        self.generations
            .get(id.index())
            .is_some_and(|gen| *gen == id.generation())
            && self.items[id.index()].is_some()
    }
}

#[cfg(feature = "parallel")]
impl<T: Send> Arena<T> {
    /// Parallel mutable iteration over live items.
    pub fn par_iter_mut(&mut self) -> impl ParallelIterator<Item = &mut T> + '_ {
        self.items.par_iter_mut().filter_map(|slot| slot.as_mut())
    }
}

pub struct ArenaIter<'a, T> {
    inner: std::slice::Iter<'a, Option<T>>,
}

impl<'a, T> Iterator for ArenaIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find_map(|slot| slot.as_ref())
    }
}

pub struct ArenaIterMut<'a, T> {
    inner: std::slice::IterMut<'a, Option<T>>,
}

impl<'a, T> Iterator for ArenaIterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find_map(|slot| slot.as_mut())
    }
}
