pub mod issues;

pub use issues::{Issue, IssueClient, IssueError};
