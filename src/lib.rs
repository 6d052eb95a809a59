pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod service;
pub mod store;
pub mod utils;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;
