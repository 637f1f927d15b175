#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

mod shutdown;
mod stream;
mod supervisor;

pub use shutdown::shutdown_child;
pub use stream::LossyLines;
pub use supervisor::{ServerProcessInfo, Supervisor};
