mod deployment;
mod job;
mod repository;

pub use deployment::*;
pub use job::*;
pub use repository::*;
