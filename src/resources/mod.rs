use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::assets::Asset;
use crate::error::SynthError;
use crate::intrinsics::*;
use crate::stack::*;

mod s3_bucket;
pub use s3_bucket::*;
mod bucket_policy;
pub use bucket_policy::*;
mod cloudfront;
pub use cloudfront::*;
mod route53;
pub use route53::*;
mod acm_cert;
pub use acm_cert::*;
mod iam;
pub use iam::*;
mod lambda;
pub use lambda::*;
mod bucket_deployment;
pub use bucket_deployment::*;

// higher level resources:
mod static_website;
pub use static_website::*;
mod cdn_website;
pub use cdn_website::*;

/// output names must be alphanumeric.
fn output_name(construct_id: &str, suffix: &str) -> String {
    let mut name: String = construct_id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    name.push_str(suffix);
    name
}
