//! Push Bridge Core Types
//!
//! Token, payload and presentation types shared by the notification bridge.

mod error;
mod event;
mod payload;
mod permission;
mod presentation;
mod token;

pub use error::*;
pub use event::*;
pub use payload::*;
pub use permission::*;
pub use presentation::*;
pub use token::*;
