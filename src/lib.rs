pub mod application;
pub mod cache;
pub mod config;
pub mod graphql;
pub mod infra;
pub mod search;
pub mod site;
