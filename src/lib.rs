pub mod client;
pub mod config;
pub mod quotation;
pub mod server;
pub mod store;
pub mod upstream;
