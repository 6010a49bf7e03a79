//! Records harvested from the upstream service
//!
//! - `Project`: one listing entry
//! - `Commit`: one commit object tagged with its project id
//! - `ProjectMeta`: license and mirror flags scraped from a project page

mod project;
mod records;

pub use project::Project;
pub use records::{Commit, ProjectMeta};
