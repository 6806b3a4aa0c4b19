pub mod account_permission;
pub mod dto;
pub mod membership;
pub mod news;
pub mod resource;

pub use resource::{DtoConversion, Operations, PageParams, ResourceController};
