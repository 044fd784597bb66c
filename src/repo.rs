// src/repo.rs

pub mod filter_store;
pub use filter_store::{FilterStore, InMemoryFilterStore, JsonFileFilterStore};
pub mod wbr_repo;
pub use wbr_repo::{HttpWbrRepository, WbrRepository};

#[cfg(test)]
pub mod fake;
