pub mod backup_exchange;
pub mod calendar;
pub mod core;
pub mod entries;
pub mod grid;
pub mod setup;
