pub mod client;
pub mod content;

pub use client::{GitHubClient, GitHubClientConfig};
