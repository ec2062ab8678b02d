//! Auth types shared across CMSECommerce crates.
//!
//! Provides JWT issuing/validation, cookie builders, and the `Identity` extractor.

pub mod cookie;
pub mod identity;
pub mod token;
