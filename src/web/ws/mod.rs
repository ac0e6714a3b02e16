//! WebSocket module for real-time article notifications.

pub mod notifications;

pub use notifications::notifications_ws_handler;
