pub mod git;
pub mod gitlab;
pub mod glab;

pub use gitlab::{CiApi, GitLabClient};
pub use glab::{CiTool, GlabCli};
