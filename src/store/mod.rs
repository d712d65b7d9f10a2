//! Store module - job metadata and org listing persistence.

mod jobs;
mod orgs;

pub use jobs::*;
pub use orgs::*;
