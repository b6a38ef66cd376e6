//! # entrypoint
//!
//! Finds the roots of deployable IaC inside a checked-out tree.
//!
//! An [`Entrypoint`] is a directory (or, for CloudFormation, a template
//! file) that one tool renders into a set of resources. Discovery walks the
//! tree once and offers every path to a list of [`Matcher`]s; the first
//! matcher that accepts a path produces its entrypoint.
//!
//! Two matchers ship with the crate:
//!
//! - [`RegexMatcher`] matches tree-relative paths against a pattern whose
//!   named captures are merged into the entrypoint context
//! - [`AutomaticMatcher`] recognises every supported type by content alone
//!
//! ```no_run
//! use entrypoint::{AutomaticMatcher, Matcher, discover};
//! use std::path::Path;
//!
//! let matchers: Vec<Box<dyn Matcher>> = vec![Box::new(AutomaticMatcher::default())];
//! for ep in discover(Path::new("/tmp/checkout"), &matchers)? {
//!     println!("{} {} ({})", ep.entrypoint_type, ep.directory, ep.name);
//! }
//! # Ok::<(), entrypoint::Error>(())
//! ```

mod discover;
pub mod error;
pub mod matcher;
pub mod types;
pub mod validate;

pub use discover::discover;
pub use error::{Error, Result};
pub use matcher::{AutomaticMatcher, Matcher, MatcherConfig, RegexMatcher, build_matchers};
pub use types::{Context, Entrypoint, EntrypointType, slugify};
