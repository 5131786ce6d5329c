pub mod config;
pub mod inventory;
pub mod purchase;
pub mod timeline;
pub mod valuation;
