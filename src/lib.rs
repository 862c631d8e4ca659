pub mod catalog;
pub mod codec;
pub mod config;
pub mod context;
pub mod coupons;
pub mod error;
pub mod keys;
pub mod registration;
pub mod repository;
pub mod service;
pub mod settlement;
pub mod store;
pub mod types;
pub mod utils;

pub use error::{ContractError, LedgerError, Operation};
pub use service::LoyaltyService;
