// src/models.rs

pub mod auth;
pub mod chart;
pub mod filters;
pub mod instagram;
pub mod page;
pub mod wbr;
