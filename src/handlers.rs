// src/handlers.rs

pub mod filters;
pub mod instagram;
pub mod wbr;
