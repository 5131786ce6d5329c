pub mod migration;
pub mod store;
