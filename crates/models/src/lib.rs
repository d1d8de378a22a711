//! Backend-neutral domain entities and their serialization codec.
//! - One struct per entity with an embedded identity block (`Meta`).
//! - Documents (JSON maps) are the exchange format for persistence and
//!   external consumers; reconstruction goes through per-type allow-lists.
//! - No storage logic here; both backends map these types.

pub mod codec;
pub mod entity;
pub mod errors;
pub mod meta;

mod amenity;
mod city;
mod place;
mod review;
mod state;
mod user;

pub use amenity::Amenity;
pub use city::City;
pub use codec::{Audience, Document, TYPE_KEY};
pub use entity::{AnyEntity, EntityKind};
pub use errors::ModelError;
pub use meta::Meta;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;
