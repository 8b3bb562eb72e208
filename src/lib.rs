//! Declares static website infrastructure as CloudFormation.
//!
//! Two builders map a handful of options onto a resource graph:
//!
//! - [`BasicSite`]: a public S3 website bucket, optionally named after a
//!   domain, with an optional redirect bucket for a sub domain.
//! - [`CdnSite`]: a private bucket behind a CloudFront distribution with an
//!   ACM certificate and a Route53 alias record.
//!
//! Both declare their resources through the [`Scope`] trait. [`Stack`] is the
//! in-memory scope that turns them into a [`SavedTemplate`].
//!
//! ```no_run
//! use sitecfn::{BasicSite, Environment, SiteOptions, Stack};
//!
//! let mut stack = Stack::new("my-site", Environment::default())?;
//! let options = SiteOptions {
//!     domain_name: Some("example.com".to_string()),
//!     ..SiteOptions::new("./public", "index.html")
//! };
//! BasicSite::new(&mut stack, "site", &options)?;
//! println!("{}", stack.synth()?.to_json_pretty()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod deploy_script;
mod error;
pub mod intrinsics;
pub mod resources;
mod stack;

pub use assets::Asset;
pub use error::SynthError;
pub use resources::{BasicSite, CdnSite, CdnSiteOptions, SiteOptions};
pub use stack::*;
