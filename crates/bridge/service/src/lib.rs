//! Push Bridge Service Layer
//!
//! Token management, delivery routing and the host-facing delegate that ties
//! them together.

mod bridge;
mod events;
mod permission;
mod router;
mod routing;
mod token;
mod traits;

#[cfg(test)]
mod testing;

pub use bridge::{BridgeOptions, NotificationBridge};
pub use events::*;
pub use permission::StaticPermission;
pub use router::*;
pub use routing::ChannelAppRouter;
pub use token::TokenManager;
pub use traits::*;
