//! Shared utilities for the event ticketing backend.
//!
//! This crate provides functionality used across the other crates:
//! - JWT access token validation (tokens are minted by the identity service)
//! - Common validation logic for request payloads

pub mod jwt;
pub mod validation;
