//! Executor module - the resumable, bounded-concurrency batch executor.

mod batch;
mod checkpoint;
mod enumerate;
mod paths;
mod pause;
mod pool;
mod recorder;
mod resume;

pub use batch::*;
pub use checkpoint::*;
pub use enumerate::*;
pub use paths::*;
pub use pause::*;
pub use pool::*;
pub use recorder::*;
pub use resume::*;
