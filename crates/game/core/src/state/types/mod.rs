mod attributes;
mod common;
mod damage;
mod entity;
mod equipment;
mod item;
mod registry;
mod resources;
mod room;

pub use attributes::{Attribute, Attributes};
pub use common::{
    EffectId, EntityId, ItemId, Position, RegistryId, RoomId, Tick, TileEffectId, TimerToken,
};
pub use damage::{DamageRange, DamageType, TypedTable};
pub use entity::{AiProfile, CarryLimits, DeathPolicy, Entity, EntityKind};
pub use equipment::{EquipSlot, Equipment, EquipmentBuilder};
pub use item::{ComponentKind, Gear, Item, ItemLocation, ItemTemplate, ItemUse, WeaponProfile};
pub use registry::Registry;
pub use resources::{BUILDUP_SCALE, Pool, ResourceKind};
pub use room::Room;
