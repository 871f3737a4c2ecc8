#![deny(warnings)]
pub mod belief;
pub mod bidding;
pub mod error;
pub mod game;
pub mod model;

pub use error::{LiarsError, Result};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "liars-dice"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "liars-dice");
        assert!(!AppInfo::version().is_empty());
    }
}
