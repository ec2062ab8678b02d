//! Domain types shared across all CMSECommerce crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod account;
pub mod pagination;
pub mod slug;
pub mod user;
