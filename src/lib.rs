//! Turn a markdown backlog into GitHub milestones, labels and issues.
//!
//! The pipeline is one-way: [`parser`] reads the document into
//! [`models::Backlog`], then [`sync`] ensures each artifact exists through an
//! [`tracker::IssueTracker`] implementation.

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod sync;
pub mod tracker;
