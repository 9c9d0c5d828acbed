use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use super::entity::{Entity, EntityId, EntityIdAllocator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("entity {id} is not registered")]
    NotFound { id: EntityId },
    #[error("entity {id} was requested twice in one mutable pair")]
    SameEntity { id: EntityId },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub admitted: usize,
    pub removed: usize,
}

/// Owns every entity of one scene.
///
/// New entities wait in a buffer until [`EntityManager::flush`]; deactivated
/// entities stay resolvable until the same flush sweeps them. The flat list and
/// every tag bucket are kept in ascending id order.
#[derive(Debug, Default)]
pub struct EntityManager {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending: Vec<Entity>,
    by_tag: BTreeMap<String, Vec<EntityId>>,
    untaken: FlushStats,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, tag: &str) -> &mut Entity {
        let id = self.allocator.allocate();
        self.pending.push(Entity::new(id, tag));
        let last = self.pending.len() - 1;
        &mut self.pending[last]
    }

    pub fn pending_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.pending.iter_mut().find(|entity| entity.id() == id)
    }

    pub fn flush(&mut self) -> FlushStats {
        let admitted = self.pending.len();
        for entity in self.pending.drain(..) {
            self.by_tag
                .entry(entity.tag().to_string())
                .or_default()
                .push(entity.id());
            self.entities.push(entity);
        }

        let before = self.entities.len();
        let mut removed_ids = Vec::new();
        self.entities.retain(|entity| {
            if entity.is_active() {
                true
            } else {
                removed_ids.push(entity.id());
                false
            }
        });
        let removed = before - self.entities.len();

        if !removed_ids.is_empty() {
            for bucket in self.by_tag.values_mut() {
                bucket.retain(|id| removed_ids.binary_search(id).is_err());
            }
        }

        if admitted > 0 || removed > 0 {
            trace!(admitted, removed, live = self.entities.len(), "registry_flushed");
        }
        self.untaken.admitted += admitted;
        self.untaken.removed += removed;

        FlushStats { admitted, removed }
    }

    /// Flush totals since the previous call.
    pub fn take_flush_stats(&mut self) -> FlushStats {
        std::mem::take(&mut self.untaken)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(Entity::id).collect()
    }

    pub fn by_tag(&self, tag: &str) -> &[EntityId] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<EntityId> {
        self.by_tag(tag).first().copied()
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_tag
            .iter()
            .map(|(tag, ids)| (tag.as_str(), ids.len()))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity, RegistryError> {
        self.index_of(id)
            .map(|index| &self.entities[index])
            .ok_or(RegistryError::NotFound { id })
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity, RegistryError> {
        match self.index_of(id) {
            Some(index) => Ok(&mut self.entities[index]),
            None => Err(RegistryError::NotFound { id }),
        }
    }

    /// Mutable access to two distinct live entities at once.
    pub fn pair_mut(
        &mut self,
        a: EntityId,
        b: EntityId,
    ) -> Result<(&mut Entity, &mut Entity), RegistryError> {
        if a == b {
            return Err(RegistryError::SameEntity { id: a });
        }
        let index_a = self.index_of(a).ok_or(RegistryError::NotFound { id: a })?;
        let index_b = self.index_of(b).ok_or(RegistryError::NotFound { id: b })?;

        if index_a < index_b {
            let (left, right) = self.entities.split_at_mut(index_b);
            Ok((&mut left[index_a], &mut right[0]))
        } else {
            let (left, right) = self.entities.split_at_mut(index_a);
            Ok((&mut right[0], &mut left[index_b]))
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops every entity, live or buffered. Ids keep increasing afterwards.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending.clear();
        self.by_tag.clear();
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities
            .binary_search_by_key(&id, Entity::id)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Health;

    fn manager_with(tags: &[&str]) -> (EntityManager, Vec<EntityId>) {
        let mut manager = EntityManager::new();
        let ids = tags
            .iter()
            .map(|tag| manager.create(tag).id())
            .collect::<Vec<_>>();
        manager.flush();
        (manager, ids)
    }

    #[test]
    fn created_entities_are_invisible_until_flush() {
        let mut manager = EntityManager::new();
        let id = manager.create("Enemy").id();

        assert!(manager.entities().is_empty());
        assert!(manager.by_tag("Enemy").is_empty());
        assert_eq!(manager.pending_len(), 1);
        assert!(manager.get(id).is_err());

        let stats = manager.flush();
        assert_eq!(stats, FlushStats { admitted: 1, removed: 0 });
        assert_eq!(manager.by_tag("Enemy"), &[id]);
        assert_eq!(manager.get(id).expect("admitted").tag(), "Enemy");
    }

    #[test]
    fn pending_entity_can_be_edited_before_admission() {
        let mut manager = EntityManager::new();
        let id = manager.create("Player").id();
        manager
            .pending_mut(id)
            .expect("pending")
            .add(Health::full(3));
        manager.flush();
        assert_eq!(
            manager
                .get(id)
                .expect("player")
                .get::<Health>()
                .expect("health")
                .current,
            3
        );
    }

    #[test]
    fn destroyed_entity_stays_resolvable_until_flush() {
        let (mut manager, ids) = manager_with(&["Tile", "Enemy", "Tile"]);
        manager.get_mut(ids[1]).expect("enemy").destroy();

        assert!(manager.get(ids[1]).is_ok());
        assert_eq!(manager.len(), 3);

        let stats = manager.flush();
        assert_eq!(stats.removed, 1);
        assert!(matches!(
            manager.get(ids[1]),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(manager.by_tag("Enemy").is_empty());
        assert_eq!(manager.by_tag("Tile"), &[ids[0], ids[2]]);
    }

    #[test]
    fn flat_list_and_tag_buckets_stay_consistent() {
        let (mut manager, ids) = manager_with(&["Tile", "Enemy", "Player", "Enemy", "Tile"]);
        manager.get_mut(ids[3]).expect("enemy").destroy();
        manager.create("Weapon");
        manager.flush();

        let bucket_total: usize = manager.tags().map(|(_, count)| count).sum();
        assert_eq!(bucket_total, manager.len());
        for entity in manager.entities() {
            let occurrences = manager
                .tags()
                .map(|(tag, _)| manager.by_tag(tag).iter().filter(|id| **id == entity.id()).count())
                .sum::<usize>();
            assert_eq!(occurrences, 1, "entity {} indexed once", entity.id());
            assert!(manager.by_tag(entity.tag()).contains(&entity.id()));
        }
    }

    #[test]
    fn entity_created_and_destroyed_before_flush_never_appears() {
        let mut manager = EntityManager::new();
        let id = manager.create("Weapon").id();
        manager.pending_mut(id).expect("pending").destroy();
        let stats = manager.flush();
        assert_eq!(stats, FlushStats { admitted: 1, removed: 1 });
        assert!(manager.is_empty());
        assert!(manager.by_tag("Weapon").is_empty());
    }

    #[test]
    fn unknown_tag_yields_empty_slice() {
        let manager = EntityManager::new();
        assert!(manager.by_tag("Nothing").is_empty());
        assert!(manager.first_by_tag("Nothing").is_none());
    }

    #[test]
    fn pair_mut_returns_both_entities_in_requested_order() {
        let (mut manager, ids) = manager_with(&["Player", "Hand"]);
        let (hand, player) = manager.pair_mut(ids[1], ids[0]).expect("pair");
        assert_eq!(hand.tag(), "Hand");
        assert_eq!(player.tag(), "Player");

        assert!(matches!(
            manager.pair_mut(ids[0], ids[0]),
            Err(RegistryError::SameEntity { .. })
        ));
        assert!(matches!(
            manager.pair_mut(ids[0], EntityId(99)),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn flush_stats_accumulate_until_taken() {
        let mut manager = EntityManager::new();
        let first = manager.create("Weapon").id();
        manager.create("Tile");
        manager.flush();
        manager.get_mut(first).expect("weapon").destroy();
        manager.create("Weapon");
        manager.flush();

        assert_eq!(
            manager.take_flush_stats(),
            FlushStats {
                admitted: 3,
                removed: 1
            }
        );
        manager.flush();
        assert_eq!(manager.take_flush_stats(), FlushStats::default());
    }

    #[test]
    fn clear_keeps_id_sequence_monotonic() {
        let (mut manager, ids) = manager_with(&["Tile"]);
        manager.clear();
        let next = manager.create("Tile").id();
        assert!(next > ids[0]);
        assert!(manager.is_empty());
    }
}
