pub mod cart;
pub mod category;
pub mod order;
pub mod repository;
pub mod subscription;
pub mod types;
pub mod upload;
