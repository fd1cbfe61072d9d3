//! Core business logic abstractions

pub mod basket;
pub mod cache;
pub mod clean;
pub mod config;
pub mod correlation;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod log;
pub mod pipeline;
pub mod price;
pub mod resample;
pub mod returns;
pub mod table;

// Re-export main types for cleaner imports
pub use correlation::CorrelationMatrix;
pub use error::NoResult;
pub use price::{PriceField, PriceProvider, PriceQuery};
pub use table::{PriceTable, ReturnTable, Table};
