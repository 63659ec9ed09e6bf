pub mod xcrc;

pub use xcrc::*;
