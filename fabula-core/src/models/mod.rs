mod draft;
mod job;
mod story;

pub use draft::*;
pub use job::*;
pub use story::*;
