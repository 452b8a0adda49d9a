//! Offline authentication and attendance queue.

mod offline_auth;
mod offline_model;
mod offline_queue;

pub use offline_auth::*;
pub use offline_model::*;
pub use offline_queue::*;
