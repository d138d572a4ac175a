//! Peddler client state core.
//!
//! This crate is the state layer of the Peddler marketplace front-end: two
//! independent stores that UI surfaces subscribe to, backed by a key-value
//! storage collaborator and the backend REST API.
//!
//! # Architecture
//!
//! - [`cart::CartStore`] - the shopping cart: line items, quantities, derived
//!   totals. Mutations are synchronous and written through to storage before
//!   they return.
//! - [`session::SessionStore`] - authentication identity: current user,
//!   bearer token, role. Mutations are driven by network round-trips.
//!
//! The stores are constructed once at application start and passed by
//! reference; neither depends on the other. Logging out deliberately leaves
//! the cart untouched (guest carts survive account switches).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use peddler_client::api::HttpAuthApi;
//! use peddler_client::cart::CartStore;
//! use peddler_client::config::ClientConfig;
//! use peddler_client::session::SessionStore;
//! use peddler_client::storage::FileStorage;
//!
//! let config = ClientConfig::from_env()?;
//! let storage = Arc::new(FileStorage::open(config.storage_path.as_ref().unwrap())?);
//! let api = Arc::new(HttpAuthApi::new(&config, storage.clone())?);
//!
//! let cart = CartStore::new(storage.clone());
//! let session = SessionStore::new(api, storage);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
