pub mod config;
pub mod gateway;
pub mod shared;
pub mod store;
pub mod worker;
