pub mod config;
pub mod report;
pub mod sample;

pub use config::*;
pub use report::*;
pub use sample::*;
