//! Stranger Chat - anonymous one-to-one chat matchmaking
//!
//! This crate provides the real-time core of the service:
//! - A FIFO waiting pool that never pairs a user with their own name
//! - Symmetric session tracking and teardown with partner notification
//! - A `WebSocket` endpoint relaying messages between paired strangers

pub mod chat;
pub mod config;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod state;
