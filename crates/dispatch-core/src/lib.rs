//! Core types and definitions for the dispatch simulation.
//!
//! This crate defines the vocabulary shared across the other crates:
//! content catalog, components, commands, snapshot views, events,
//! rejection reasons and tuning constants.
//! It has no dependency on any runtime or presentation framework.

pub mod catalog;
pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
