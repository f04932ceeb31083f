//! Core data types for the currency threshold watcher.

pub mod favorite;
pub mod notification;
pub mod quote;

pub use favorite::*;
pub use notification::*;
pub use quote::*;
