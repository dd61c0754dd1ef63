//! # Repository Layer
//!
//! SeaORM-backed access to the tenant-scoped integration, menu and order
//! tables.

pub mod integration;
pub mod menu_item;
pub mod order;

pub use integration::IntegrationRepository;
pub use menu_item::MenuItemRepository;
pub use order::OrderRepository;
