pub mod chart_service;
pub mod currency_service;
pub mod inventory_service;
pub mod price_service;
pub mod timeline_service;
pub mod valuation_service;
