use std::fmt;

use serde::Serialize;

use super::components::{Component, ComponentKind, ComponentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    tag: String,
    active: bool,
    components: ComponentStore,
}

impl Entity {
    pub(crate) fn new(id: EntityId, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into(),
            active: true,
            components: ComponentStore::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the entity for removal at the next registry flush.
    pub fn destroy(&mut self) {
        self.active = false;
    }

    pub fn add<T: Component>(&mut self, component: T) -> &mut T {
        self.components.add(component)
    }

    pub fn has<T: Component>(&self) -> bool {
        self.components.has::<T>()
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    pub fn remove<T: Component>(&mut self) {
        self.components.remove::<T>();
    }

    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.components.kinds()
    }
}
