// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keyed, reference-counted resources kept in most-recently-used order.
//!
//! Nodes live in an arena and are linked into a circular doubly-linked list
//! anchored at a permanent sentinel (slot `0`). The front of the list is the
//! most recently used entry. Links are arena indices, so a stale link can at
//! worst name a recycled slot, which the generation check in [`ResourceId`]
//! rejects.

use std::collections::HashMap;

const SENTINEL: u32 = 0;

/// Handle to a cached resource.
///
/// Combines an arena index with a generation count. When a slot is freed and
/// recycled its generation is bumped, so old handles stop resolving instead
/// of silently reaching the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    index: u32,
    generation: u32,
}

struct Node<R> {
    prev: u32,
    next: u32,
    generation: u32,
    ref_count: u32,
    key: Option<String>,
    resource: Option<R>,
}

impl<R> Node<R> {
    fn detached(index: u32, generation: u32) -> Self {
        Self {
            prev: index,
            next: index,
            generation,
            ref_count: 0,
            key: None,
            resource: None,
        }
    }
}

/// An MRU registry of reference-counted resources.
pub struct ResourceCache<R> {
    nodes: Vec<Node<R>>,
    free: Vec<u32>,
    index: HashMap<String, ResourceId>,
    live: usize,
}

impl<R> ResourceCache<R> {
    /// Creates an empty cache holding only the sentinel.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::detached(SENTINEL, 0)],
            free: Vec::new(),
            index: HashMap::new(),
            live: 0,
        }
    }

    /// Number of live resources, linked or not.
    pub fn len(&self) -> usize {
        self.live
    }

    /// `true` when no resource is alive.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Adds `resource` at the front with one reference, indexed by `key`.
    ///
    /// A key already in use is moved to the new resource; the previous
    /// holder stays alive (and linked) until its last reference is released.
    pub fn register(&mut self, resource: R, key: Option<&str>) -> ResourceId {
        let id = self.allocate(resource);
        self.link_front(id.index);

        if let Some(key) = key {
            self.node_mut(id.index).key = Some(key.to_owned());
            if let Some(previous) = self.index.insert(key.to_owned(), id) {
                if let Some(node) = self.resolve_mut(previous) {
                    node.key = None;
                }
            }
        }

        log::trace!("Registered resource {id:?} under {key:?}.");
        id
    }

    /// Registers `resource` under `key`, or with `None` drops the entry.
    ///
    /// Dropping unindexes the key and unlinks its node; the resource itself
    /// lives on until its references are released.
    pub fn set_resource(&mut self, resource: Option<R>, key: &str) -> Option<ResourceId> {
        match resource {
            Some(resource) => Some(self.register(resource, Some(key))),
            None => {
                self.remove_key(key);
                None
            }
        }
    }

    /// Unindexes `key` and unlinks its node. Returns `false` for unknown keys.
    pub fn remove_key(&mut self, key: &str) -> bool {
        let Some(id) = self.index.remove(key) else {
            return false;
        };
        if self.resolve(id).is_some() {
            self.node_mut(id.index).key = None;
            self.unlink(id.index);
        }
        true
    }

    /// The resource registered under `key`.
    pub fn lookup(&self, key: &str) -> Option<&R> {
        self.lookup_id(key).and_then(|id| self.get(id))
    }

    /// The handle registered under `key`.
    pub fn lookup_id(&self, key: &str) -> Option<ResourceId> {
        self.index.get(key).copied()
    }

    /// The resource behind `id`, if it is still alive.
    pub fn get(&self, id: ResourceId) -> Option<&R> {
        self.resolve(id).and_then(|node| node.resource.as_ref())
    }

    /// The key `id` is indexed under, if any.
    pub fn key_of(&self, id: ResourceId) -> Option<&str> {
        self.resolve(id).and_then(|node| node.key.as_deref())
    }

    /// Moves `id` to the front of the MRU order. The key index is untouched.
    pub fn touch(&mut self, id: ResourceId) -> bool {
        if self.resolve(id).is_none() {
            return false;
        }
        self.unlink(id.index);
        self.link_front(id.index);
        true
    }

    /// Adds a reference to `id`.
    pub fn retain(&mut self, id: ResourceId) -> bool {
        match self.resolve_mut(id) {
            Some(node) => {
                node.ref_count += 1;
                true
            }
            None => false,
        }
    }

    /// Drops a reference to `id`.
    ///
    /// At zero the node is unlinked, unindexed and freed, and the resource is
    /// handed back to the caller.
    pub fn release(&mut self, id: ResourceId) -> Option<R> {
        let node = self.resolve_mut(id)?;
        node.ref_count -= 1;
        if node.ref_count > 0 {
            return None;
        }
        self.destroy(id)
    }

    /// Current reference count of `id`.
    pub fn ref_count(&self, id: ResourceId) -> Option<u32> {
        self.resolve(id).map(|node| node.ref_count)
    }

    /// Linked resources from most to least recently used.
    pub fn iter_mru(&self) -> impl Iterator<Item = (ResourceId, &R)> + '_ {
        let mut cursor = self.nodes[SENTINEL as usize].next;
        std::iter::from_fn(move || {
            while cursor != SENTINEL {
                let index = cursor;
                let node = &self.nodes[index as usize];
                cursor = node.next;
                if let Some(resource) = node.resource.as_ref() {
                    let id = ResourceId {
                        index,
                        generation: node.generation,
                    };
                    return Some((id, resource));
                }
            }
            None
        })
    }

    /// Frees every resource and resets the sentinel.
    ///
    /// Slots are kept for reuse with bumped generations, so handles taken
    /// before the call stay invalid afterwards.
    pub fn clear(&mut self) -> Vec<R> {
        let mut released = Vec::with_capacity(self.live);
        self.free.clear();
        for (slot, node) in self.nodes.iter_mut().enumerate().skip(1) {
            let index = slot as u32;
            let mut generation = node.generation;
            if let Some(resource) = node.resource.take() {
                released.push(resource);
                generation = generation.wrapping_add(1);
            }
            *node = Node::detached(index, generation);
            self.free.push(index);
        }
        self.nodes[SENTINEL as usize] = Node::detached(SENTINEL, 0);
        self.index.clear();
        self.live = 0;
        released
    }

    fn allocate(&mut self, resource: R) -> ResourceId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
                self.nodes.push(Node::detached(index, 0));
                index
            }
        };

        self.live += 1;
        let node = self.node_mut(index);
        node.ref_count = 1;
        node.resource = Some(resource);

        ResourceId {
            index,
            generation: node.generation,
        }
    }

    fn destroy(&mut self, id: ResourceId) -> Option<R> {
        self.unlink(id.index);

        let key = self.node_mut(id.index).key.take();
        if let Some(key) = key {
            if self.index.get(&key) == Some(&id) {
                self.index.remove(&key);
            }
        }

        let node = self.node_mut(id.index);
        node.generation = node.generation.wrapping_add(1);
        let resource = node.resource.take();
        self.free.push(id.index);
        self.live -= 1;

        log::trace!("Destroyed resource {id:?}.");
        resource
    }

    fn link_front(&mut self, index: u32) {
        let first = self.nodes[SENTINEL as usize].next;
        {
            let node = self.node_mut(index);
            node.prev = SENTINEL;
            node.next = first;
        }
        self.node_mut(first).prev = index;
        self.node_mut(SENTINEL).next = index;
    }

    fn unlink(&mut self, index: u32) {
        let (prev, next) = {
            let node = &self.nodes[index as usize];
            (node.prev, node.next)
        };
        self.node_mut(prev).next = next;
        self.node_mut(next).prev = prev;

        let node = self.node_mut(index);
        node.prev = index;
        node.next = index;
    }

    fn resolve(&self, id: ResourceId) -> Option<&Node<R>> {
        if id.index == SENTINEL {
            return None;
        }
        self.nodes
            .get(id.index as usize)
            .filter(|node| node.generation == id.generation && node.resource.is_some())
    }

    fn resolve_mut(&mut self, id: ResourceId) -> Option<&mut Node<R>> {
        if id.index == SENTINEL {
            return None;
        }
        self.nodes
            .get_mut(id.index as usize)
            .filter(|node| node.generation == id.generation && node.resource.is_some())
    }

    fn node_mut(&mut self, index: u32) -> &mut Node<R> {
        &mut self.nodes[index as usize]
    }
}

impl<R> Default for ResourceCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for ResourceCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("live", &self.live)
            .field("indexed", &self.index.len())
            .field("slots", &self.nodes.len())
            .finish()
    }
}
