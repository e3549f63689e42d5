// src/handlers/mod.rs
pub mod dashboard;
pub mod data;
pub mod error;
pub mod fields;
pub mod views;
