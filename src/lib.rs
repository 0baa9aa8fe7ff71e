//! gamedex library
//!
//! The local persistence layer of the game catalog browser (response cache and
//! user data store) plus the catalog client and CLI built on top of it.

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod storage;
pub mod user;
