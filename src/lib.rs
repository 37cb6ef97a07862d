// src/lib.rs

pub mod analysis;
pub mod batch;
pub mod config;
pub mod feedback;
pub mod gemini;
pub mod insights;
