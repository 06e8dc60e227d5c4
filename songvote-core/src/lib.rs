//! Domain types and rules for group song voting: suggestions, votes, and how they rank.

mod config;
mod events;
mod ranking;
mod song;
mod user;
mod util;
mod validation;
mod vote;

pub use config::*;
pub use events::*;
pub use ranking::*;
pub use song::*;
pub use user::*;
pub use util::*;
pub use validation::*;
pub use vote::*;
