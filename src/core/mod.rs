//! Core business logic abstractions

pub mod allocation;
pub mod config;
pub mod log;
pub mod market_data;
pub mod notice;
pub mod price;
pub mod strategy;

// Re-export main types for cleaner imports
pub use allocation::{Allocation, AllocationMode, AllocationRequest, allocate};
pub use notice::Notice;
pub use price::{DailyClose, PriceProvider};
pub use strategy::Strategy;
