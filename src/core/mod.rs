//! Core library components.
//!
//! This module contains the reusable logic for parameter declaration,
//! resolution, change detection, and config-document decryption.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod document;
pub mod env;
pub mod graph;
pub mod param;
pub mod registry;
