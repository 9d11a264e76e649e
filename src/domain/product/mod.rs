//! Product domain - try-on enabled catalogue items owned by a merchant

mod entity;
mod repository;

pub use entity::{Product, ProductId};
pub use repository::ProductRepository;

#[cfg(test)]
pub use repository::mock;
