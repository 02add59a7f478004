//! Domain models for backlog-sync.
//!
//! # Parsed Records
//!
//! - [`MilestoneRecord`]: A milestone heading and the tasks listed under it.
//! - [`TaskRecord`]: One table row of the backlog.
//! - [`Backlog`]: All milestones of a document, in document order.
//!
//! # Tracker Artifacts
//!
//! - [`LabelSpec`]: A label derived from milestone ids and the fixed priority/status levels.
//! - [`Milestone`]: The tracker's view of a milestone (number + title).
//! - [`NewIssue`]: Everything needed to create an issue.

mod issue;
mod label;
mod milestone;
mod task;

pub use issue::*;
pub use label::*;
pub use milestone::*;
pub use task::*;
