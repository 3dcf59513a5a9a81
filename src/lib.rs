//! News Reader - a reactive client for a news article API
//!
//! Fetches articles for a selected source and keeps a filtered, sorted view
//! of them up to date as the source, sort order or title filter change.

pub mod article;
pub mod client;
pub mod command;
pub mod config;
pub mod ordering;
pub mod render;
pub mod store;
pub mod view;
