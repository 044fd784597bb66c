// src/services.rs

pub mod chart_service;
pub mod filter_service;
pub mod instagram_service;
pub mod page_loader;
pub mod page_session;
