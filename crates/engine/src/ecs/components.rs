use crate::animation::Animation;
use crate::geometry::Vec2;

use super::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Transform,
    Input,
    Lifespan,
    Damage,
    Invincibility,
    Health,
    AnimationState,
    StateTag,
    BoundingBox,
    FollowBehavior,
    PatrolBehavior,
    Draggable,
    HandLink,
}

pub const COMPONENT_KIND_COUNT: usize = 13;

impl ComponentKind {
    pub const ALL: [ComponentKind; COMPONENT_KIND_COUNT] = [
        ComponentKind::Transform,
        ComponentKind::Input,
        ComponentKind::Lifespan,
        ComponentKind::Damage,
        ComponentKind::Invincibility,
        ComponentKind::Health,
        ComponentKind::AnimationState,
        ComponentKind::StateTag,
        ComponentKind::BoundingBox,
        ComponentKind::FollowBehavior,
        ComponentKind::PatrolBehavior,
        ComponentKind::Draggable,
        ComponentKind::HandLink,
    ];

    pub const fn index(self) -> usize {
        match self {
            ComponentKind::Transform => 0,
            ComponentKind::Input => 1,
            ComponentKind::Lifespan => 2,
            ComponentKind::Damage => 3,
            ComponentKind::Invincibility => 4,
            ComponentKind::Health => 5,
            ComponentKind::AnimationState => 6,
            ComponentKind::StateTag => 7,
            ComponentKind::BoundingBox => 8,
            ComponentKind::FollowBehavior => 9,
            ComponentKind::PatrolBehavior => 10,
            ComponentKind::Draggable => 11,
            ComponentKind::HandLink => 12,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::Input => "Input",
            ComponentKind::Lifespan => "Lifespan",
            ComponentKind::Damage => "Damage",
            ComponentKind::Invincibility => "Invincibility",
            ComponentKind::Health => "Health",
            ComponentKind::AnimationState => "AnimationState",
            ComponentKind::StateTag => "StateTag",
            ComponentKind::BoundingBox => "BoundingBox",
            ComponentKind::FollowBehavior => "FollowBehavior",
            ComponentKind::PatrolBehavior => "PatrolBehavior",
            ComponentKind::Draggable => "Draggable",
            ComponentKind::HandLink => "HandLink",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub scale: Vec2,
    pub velocity: Vec2,
    pub facing: Vec2,
    pub angle: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            prev_pos: Vec2::ZERO,
            scale: Vec2::ONE,
            velocity: Vec2::ZERO,
            facing: Vec2::ZERO,
            angle: 0.0,
        }
    }
}

impl Transform {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            prev_pos: pos,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub attack: bool,
    pub can_attack: bool,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
            attack: false,
            can_attack: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifespan {
    pub remaining_ticks: i32,
    pub created_at_frame: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Damage {
    pub amount: i32,
}

impl Default for Damage {
    fn default() -> Self {
        Self { amount: 1 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invincibility {
    pub remaining_frames: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub max: i32,
    pub current: i32,
}

impl Default for Health {
    fn default() -> Self {
        Self { max: 1, current: 1 }
    }
}

impl Health {
    pub fn full(max: i32) -> Self {
        Self { max, current: max }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationState {
    pub animation: Animation,
    pub repeat: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Maps a facing vector to a cardinal direction; the zero facing counts as down.
    pub fn from_facing(facing: Vec2) -> Self {
        if facing.x > 0.0 {
            Direction::Right
        } else if facing.x < 0.0 {
            Direction::Left
        } else if facing.y < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Pose {
    #[default]
    Stand,
    Run,
    Atk,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActorState {
    pub pose: Pose,
    pub direction: Direction,
}

impl ActorState {
    pub const fn new(pose: Pose, direction: Direction) -> Self {
        Self { pose, direction }
    }

    pub const fn as_str(self) -> &'static str {
        match (self.pose, self.direction) {
            (Pose::Stand, Direction::Up) => "StandUp",
            (Pose::Stand, Direction::Down) => "StandDown",
            (Pose::Stand, Direction::Left) => "StandLeft",
            (Pose::Stand, Direction::Right) => "StandRight",
            (Pose::Run, Direction::Up) => "RunUp",
            (Pose::Run, Direction::Down) => "RunDown",
            (Pose::Run, Direction::Left) => "RunLeft",
            (Pose::Run, Direction::Right) => "RunRight",
            (Pose::Atk, Direction::Up) => "AtkUp",
            (Pose::Atk, Direction::Down) => "AtkDown",
            (Pose::Atk, Direction::Left) => "AtkLeft",
            (Pose::Atk, Direction::Right) => "AtkRight",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTag {
    pub state: ActorState,
    /// Base animation name; per-state animations are looked up as `<sprite><State>`.
    pub sprite: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub pos: Vec2,
    pub offset: Vec2,
    pub size: Vec2,
    pub half_size: Vec2,
    pub block_move: bool,
    pub block_vision: bool,
}

impl BoundingBox {
    /// Builds a box anchored at `anchor + offset`.
    pub fn new(anchor: Vec2, offset: Vec2, size: Vec2, block_move: bool, block_vision: bool) -> Self {
        Self {
            pos: anchor + offset,
            offset,
            size,
            half_size: size / 2.0,
            block_move,
            block_vision,
        }
    }

    pub fn sync_to(&mut self, anchor: Vec2) {
        self.pos = anchor + self.offset;
    }

    pub fn min(&self) -> Vec2 {
        self.pos - self.half_size
    }

    pub fn max(&self) -> Vec2 {
        self.pos + self.half_size
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FollowBehavior {
    pub home: Vec2,
    pub speed: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatrolBehavior {
    pub waypoints: Vec<Vec2>,
    pub current_index: usize,
    pub speed: f32,
}

impl PatrolBehavior {
    pub fn next_index(&self) -> usize {
        if self.waypoints.is_empty() {
            return 0;
        }
        (self.current_index + 1) % self.waypoints.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Draggable {
    pub dragging: bool,
}

/// Weak, id-based link between a character and its hand.
///
/// On a character `linked` names its hand; on a hand `linked` names the owner
/// and `weapon` names the weapon currently held, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLink {
    pub linked: EntityId,
    pub weapon: Option<EntityId>,
    pub offset: Vec2,
}

impl Default for HandLink {
    fn default() -> Self {
        Self {
            linked: EntityId(0),
            weapon: None,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    present: [bool; COMPONENT_KIND_COUNT],
    transform: Transform,
    input: Input,
    lifespan: Lifespan,
    damage: Damage,
    invincibility: Invincibility,
    health: Health,
    animation: AnimationState,
    state: StateTag,
    bounding_box: BoundingBox,
    follow: FollowBehavior,
    patrol: PatrolBehavior,
    draggable: Draggable,
    hand: HandLink,
}

impl ComponentStore {
    pub fn has_kind(&self, kind: ComponentKind) -> bool {
        self.present[kind.index()]
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(|kind| self.present[kind.index()])
            .collect()
    }

    fn set_present(&mut self, kind: ComponentKind, present: bool) {
        self.present[kind.index()] = present;
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A record kind stored in one fixed slot of every [`ComponentStore`].
pub trait Component: sealed::Sealed + Default + Sized {
    const KIND: ComponentKind;

    #[doc(hidden)]
    fn slot(store: &ComponentStore) -> &Self;
    #[doc(hidden)]
    fn slot_mut(store: &mut ComponentStore) -> &mut Self;
}

macro_rules! component_slot {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl sealed::Sealed for $ty {}

        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn slot(store: &ComponentStore) -> &Self {
                &store.$field
            }

            fn slot_mut(store: &mut ComponentStore) -> &mut Self {
                &mut store.$field
            }
        }
    };
}

component_slot!(Transform, Transform, transform);
component_slot!(Input, Input, input);
component_slot!(Lifespan, Lifespan, lifespan);
component_slot!(Damage, Damage, damage);
component_slot!(Invincibility, Invincibility, invincibility);
component_slot!(Health, Health, health);
component_slot!(AnimationState, AnimationState, animation);
component_slot!(StateTag, StateTag, state);
component_slot!(BoundingBox, BoundingBox, bounding_box);
component_slot!(FollowBehavior, FollowBehavior, follow);
component_slot!(PatrolBehavior, PatrolBehavior, patrol);
component_slot!(Draggable, Draggable, draggable);
component_slot!(HandLink, HandLink, hand);

impl ComponentStore {
    pub fn add<T: Component>(&mut self, component: T) -> &mut T {
        self.set_present(T::KIND, true);
        let slot = T::slot_mut(self);
        *slot = component;
        slot
    }

    pub fn has<T: Component>(&self) -> bool {
        self.has_kind(T::KIND)
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        if self.has::<T>() {
            Some(T::slot(self))
        } else {
            None
        }
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        if self.has::<T>() {
            Some(T::slot_mut(self))
        } else {
            None
        }
    }

    pub fn remove<T: Component>(&mut self) {
        self.set_present(T::KIND, false);
        *T::slot_mut(self) = T::default();
    }
}
