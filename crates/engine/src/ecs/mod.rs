mod components;
mod entity;
mod manager;

pub use components::{
    ActorState, AnimationState, BoundingBox, Component, ComponentKind, ComponentStore, Damage,
    Direction, Draggable, FollowBehavior, HandLink, Health, Input, Invincibility, Lifespan,
    PatrolBehavior, Pose, StateTag, Transform, COMPONENT_KIND_COUNT,
};
pub use entity::{Entity, EntityId, EntityIdAllocator};
pub use manager::{EntityManager, FlushStats, RegistryError};
