#![forbid(unsafe_code)]

pub mod distractor;
pub mod model;
pub mod provider;
pub mod shuffle;
pub mod time;

pub use provider::ContentProvider;
pub use time::Clock;
