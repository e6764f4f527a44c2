//! # parlor-core
//!
//! Foundation types and utilities for the parlor chat relay.
//!
//! This crate provides the shared vocabulary the other parlor crates depend on:
//!
//! - **Roles**: [`role::SenderRole`] — the closed `user` / `admin` sum type
//! - **Text**: [`text::truncate_str`] and friends for UTF-8-safe log previews
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `parlor-store` and `parlor-server`.

#![deny(unsafe_code)]

pub mod logging;
pub mod role;
pub mod text;
