//! Dry-run sandbox backends: a local template-copy sandbox and a git-clone
//! remote sandbox, both implementing the core `Sandbox` trait.

pub mod diff_text;
pub mod local;
pub mod remote;
pub mod runner;
pub mod workdir;

pub use local::{LocalSandbox, DEFAULT_LOCAL_TIMEOUT};
pub use remote::{RemoteSandbox, DEFAULT_REMOTE_TIMEOUT};
