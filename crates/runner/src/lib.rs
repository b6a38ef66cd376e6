//! # runner
//!
//! External process execution for the diff pipeline.
//!
//! Every tool the pipeline shells out to (`git`, `kustomize`, `terraform`,
//! `npm`) goes through [`Cmd`], which captures output and polls a shared
//! [`CancelToken`] while the child runs. A cancelled token kills the child
//! and surfaces [`Error::Cancelled`].
//!
//! ```no_run
//! use runner::{CancelToken, Cmd};
//!
//! let cancel = CancelToken::new();
//! let head = Cmd::new("git")
//!     .args(["rev-parse", "HEAD"])
//!     .run_checked(&cancel)?;
//! println!("{head}");
//! # Ok::<(), runner::Error>(())
//! ```

pub mod cancel;
pub mod command;
pub mod error;

pub use cancel::CancelToken;
pub use command::{Cmd, Output};
pub use error::{Error, Result};
