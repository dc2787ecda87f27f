//! Worker addons for watched.com.
//!
//! A worker addon declares the actions it supports in its properties and
//! binds a handler to each action at startup. Transports look handlers up by
//! action and invoke them with the request payload and an [`ActionContext`].

mod addon;
mod context;
mod dispatch;
mod error;
mod fetch;
mod handler;
mod props;
mod types;

pub use addon::*;
pub use context::*;
pub use dispatch::*;
pub use error::*;
pub use fetch::*;
pub use handler::*;
pub use props::*;
pub use types::*;
