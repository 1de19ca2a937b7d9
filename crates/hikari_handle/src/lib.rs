mod common;
mod raw;

pub use common::*;
pub use raw::*;
