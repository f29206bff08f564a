pub mod aggregators;
pub mod pipeline;
pub mod statistical;

pub use aggregators::*;
pub use pipeline::*;
pub use statistical::*;
