//! `shelfwatch-core`: catalog model shared by every shelfwatch crate.
//!
//! This crate contains **pure data** (no IO, no async): the product item shape
//! as the catalog service returns it, its identifiers, and the domain error.

pub mod entity;
pub mod error;
pub mod id;
pub mod item;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EventId, ItemId};
pub use item::{Item, MarketMetadata, Price, StockLevel, Variant};
