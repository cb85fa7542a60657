//! `shelfwatch-client`
//!
//! **Responsibility:** HTTP access to the catalog service.
//!
//! This crate provides:
//! - Paginated item fetches (`PageSource`, implemented by `CatalogClient`)
//! - Single and batch item create/update/delete
//! - Endpoint configuration from the environment
//!
//! No retries happen here; callers decide whether and when to try again.

pub mod config;
pub mod dto;
pub mod error;
pub mod page;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use dto::{ItemPatch, NewItem};
pub use error::{ErrorBody, TransportError};
pub use page::Page;
pub use transport::{CatalogClient, PageSource};
