pub mod component;
pub mod connection;
pub mod definition;
pub mod parser;
pub mod persistence;
pub mod types;
