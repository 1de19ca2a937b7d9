mod erased;
mod typed;

pub use erased::*;
pub use typed::*;
