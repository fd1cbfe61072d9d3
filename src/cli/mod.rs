pub mod baskets;
pub mod correlate;
pub mod setup;
pub mod ui;
