use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::assets::{self, Asset};
use crate::error::SynthError;
use crate::intrinsics::{get_att, get_ref};
use crate::resources::{validate_bucket_name, CfnBucket, CfnBucketPolicy, CfnCertificate, CfnDistribution, CfnRecordSet};

/// name of the template parameter holding the bucket that staged assets
/// (and the deployment handler code) are uploaded to before deploying.
pub const STAGING_BUCKET_PARAM: &str = "StagingBucketName";

/// Where the stack is going to be deployed, and where its assets get staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub account: Option<String>,
    pub region: String,
    pub staging_bucket: String,
    /// object key, in the staging bucket, of the zipped bucket deployment handler.
    pub handler_key: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            account: None,
            region: "us-east-1".to_string(),
            staging_bucket: "sitecfn-staging".to_string(),
            handler_key: "handlers/bucket-deployment.zip".to_string(),
        }
    }
}

impl Environment {
    /// these values end up in the deploy script as well as the template.
    pub fn validate(&self) -> Result<(), SynthError> {
        let err = |field: &'static str, reason: String| SynthError::InvalidEnvironment { field, reason };
        validate_bucket_name(&self.staging_bucket).map_err(|reason| err("staging_bucket", reason))?;
        let region_ok = !self.region.is_empty()
            && self.region.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !region_ok {
            return Err(err("region", format!("{:?} is not a region name like us-east-1", self.region)));
        }
        if let Some(account) = &self.account {
            if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
                return Err(err("account", format!("{account:?} must be a 12 digit account id")));
            }
        }
        let key_ok = !self.handler_key.is_empty()
            && !self.handler_key.starts_with('/')
            && self
                .handler_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'));
        if !key_ok {
            return Err(err(
                "handler_key",
                format!("{:?} may only contain letters, digits, '/', '-', '_' and '.'", self.handler_key),
            ));
        }
        Ok(())
    }
}

/// The logical name of a resource in the template. Derived from a
/// construct path like `mysite/WebsiteBucket`: the alphanumeric characters
/// of the path followed by an 8 digit checksum of the full path, so
/// different paths that sanitize to the same text still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalId(String);

impl LogicalId {
    const MAX_HUMAN_LEN: usize = 255 - 8;

    pub fn from_path(path: &str) -> Self {
        let human: String = path
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(Self::MAX_HUMAN_LEN)
            .collect();
        let hash = adler::adler32_slice(path.as_bytes());
        LogicalId(format!("{human}{hash:08X}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn get_ref(&self) -> Value {
        get_ref(&self.0)
    }

    pub fn get_att(&self, attribute: &str) -> Value {
        get_att(&self.0, attribute)
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed resource declaration that knows its CloudFormation type
/// and how to render its `Properties`.
pub trait CfnResource: fmt::Debug {
    fn type_string(&self) -> &'static str;
    fn properties(&self) -> Result<Value, serde_json::Error>;
    /// checked before the resource is accepted into a stack.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// What happens to the physical resource when it is removed from the stack
/// (or the stack is deleted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    #[default]
    Retain,
    Destroy,
}

impl RemovalPolicy {
    fn as_cfn(self) -> &'static str {
        match self {
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Destroy => "Delete",
        }
    }
}

#[derive(Debug)]
pub struct Resource {
    pub name: LogicalId,
    pub properties: Box<dyn CfnResource>,
    pub removal_policy: Option<RemovalPolicy>,
    pub depends_on: Vec<LogicalId>,
}

impl Resource {
    pub fn new(name: LogicalId, properties: impl CfnResource + 'static) -> Self {
        Self {
            name,
            properties: Box::new(properties),
            removal_policy: None,
            depends_on: vec![],
        }
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    pub fn depends_on(mut self, other: &LogicalId) -> Self {
        self.depends_on.push(other.clone());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(rename = "DeletionPolicy", default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(rename = "UpdateReplacePolicy", default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Default", default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Value")]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Parameters", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, SavedResource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, ResourceOutput>,
}

impl Default for SavedTemplate {
    fn default() -> Self {
        Self {
            version: "2010-09-09".to_string(),
            parameters: Default::default(),
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl SavedTemplate {
    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a SavedResource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The narrow interface site builders declare their resources through.
/// [`Stack`] is the in-memory implementation that synthesizes a template.
///
/// Declarations are not transactional. When a builder returns an error, the
/// resources it declared before the failing one stay in the scope, so the
/// scope should be discarded rather than synthesized.
pub trait Scope {
    fn env(&self) -> &Environment;
    fn contains(&self, id: &LogicalId) -> bool;
    fn add_resource(&mut self, resource: Resource) -> Result<LogicalId, SynthError>;
    fn add_output(&mut self, name: &str, output: ResourceOutput) -> Result<(), SynthError>;
    fn add_parameter(&mut self, name: &str, parameter: Parameter);
    fn stage_asset(&mut self, folder: &Path) -> Result<Asset, SynthError>;

    fn logical_id(&self, path: &str) -> LogicalId {
        LogicalId::from_path(path)
    }

    fn declare<R: CfnResource + 'static>(&mut self, path: &str, resource: R) -> Result<LogicalId, SynthError> {
        let id = self.logical_id(path);
        self.add_resource(Resource::new(id, resource))
    }

    fn declare_bucket(&mut self, path: &str, bucket: CfnBucket, removal_policy: RemovalPolicy) -> Result<LogicalId, SynthError> {
        let id = self.logical_id(path);
        self.add_resource(Resource::new(id, bucket).with_removal_policy(removal_policy))
    }

    fn declare_bucket_policy(&mut self, path: &str, policy: CfnBucketPolicy) -> Result<LogicalId, SynthError> {
        self.declare(path, policy)
    }

    fn declare_distribution(&mut self, path: &str, distribution: CfnDistribution) -> Result<LogicalId, SynthError> {
        self.declare(path, distribution)
    }

    fn declare_certificate(&mut self, path: &str, certificate: CfnCertificate) -> Result<LogicalId, SynthError> {
        self.declare(path, certificate)
    }

    fn declare_dns_record(&mut self, path: &str, record: CfnRecordSet) -> Result<LogicalId, SynthError> {
        self.declare(path, record)
    }
}

#[derive(Debug)]
pub struct Stack {
    name: String,
    env: Environment,
    resources: Vec<Resource>,
    parameters: BTreeMap<String, Parameter>,
    outputs: BTreeMap<String, ResourceOutput>,
    assets: Vec<Asset>,
}

impl Stack {
    pub fn new(name: &str, env: Environment) -> Result<Self, SynthError> {
        validate_stack_name(name)?;
        env.validate()?;
        Ok(Self {
            name: name.to_string(),
            env,
            resources: vec![],
            parameters: Default::default(),
            outputs: Default::default(),
            assets: vec![],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn synth(&self) -> Result<SavedTemplate, SynthError> {
        let mut out_template = SavedTemplate::default();
        for resource in self.resources.iter() {
            let properties = resource.properties.properties().map_err(|source| SynthError::Serialize {
                name: resource.name.to_string(),
                source,
            })?;
            let policy = resource.removal_policy.map(|p| p.as_cfn().to_string());
            let saved_resource = SavedResource {
                ty: resource.properties.type_string().to_string(),
                properties,
                depends_on: resource.depends_on.iter().map(|d| d.to_string()).collect(),
                deletion_policy: policy.clone(),
                update_replace_policy: policy,
            };
            out_template.resources.insert(resource.name.to_string(), saved_resource);
        }
        out_template.parameters = self.parameters.clone();
        out_template.outputs = self.outputs.clone();
        info!(
            stack = %self.name,
            resources = out_template.resources.len(),
            outputs = out_template.outputs.len(),
            "synthesized template"
        );
        Ok(out_template)
    }
}

impl Scope for Stack {
    fn env(&self) -> &Environment {
        &self.env
    }

    fn contains(&self, id: &LogicalId) -> bool {
        self.resources.iter().any(|r| &r.name == id)
    }

    fn add_resource(&mut self, resource: Resource) -> Result<LogicalId, SynthError> {
        if self.contains(&resource.name) {
            return Err(SynthError::DuplicateLogicalId(resource.name.to_string()));
        }
        if let Err(reason) = resource.properties.validate() {
            return Err(SynthError::Validation { name: resource.name.to_string(), reason });
        }
        debug!(id = %resource.name, ty = resource.properties.type_string(), "declared resource");
        let id = resource.name.clone();
        self.resources.push(resource);
        Ok(id)
    }

    fn add_output(&mut self, name: &str, output: ResourceOutput) -> Result<(), SynthError> {
        if self.outputs.contains_key(name) {
            return Err(SynthError::DuplicateOutput(name.to_string()));
        }
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    fn add_parameter(&mut self, name: &str, parameter: Parameter) {
        self.parameters.insert(name.to_string(), parameter);
    }

    fn stage_asset(&mut self, folder: &Path) -> Result<Asset, SynthError> {
        let asset = assets::stage(folder)?;
        if !self.parameters.contains_key(STAGING_BUCKET_PARAM) {
            let parameter = Parameter {
                ty: "String".to_string(),
                default: Some(self.env.staging_bucket.clone()),
                description: Some("bucket holding staged assets and the deployment handler".to_string()),
            };
            self.add_parameter(STAGING_BUCKET_PARAM, parameter);
        }
        // the same folder may be deployed more than once; package it once.
        if !self.assets.iter().any(|a| a.hash == asset.hash) {
            self.assets.push(asset.clone());
        }
        Ok(asset)
    }
}

fn validate_stack_name(stack_name: &str) -> Result<(), SynthError> {
    // A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
    // It must start with an alphabetical character and can't be longer than 128 characters.
    let reason = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";
    let err = || SynthError::InvalidStackName { name: stack_name.to_string(), reason };
    match stack_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(err()),
    }
    if !stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(err());
    }
    if stack_name.len() > 128 {
        return Err(err());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Dummy(&'static str);

    impl CfnResource for Dummy {
        fn type_string(&self) -> &'static str {
            "Custom::Dummy"
        }
        fn properties(&self) -> Result<Value, serde_json::Error> {
            Ok(json!({ "Name": self.0 }))
        }
        fn validate(&self) -> Result<(), String> {
            if self.0.is_empty() {
                return Err("Name is required".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn logical_ids_are_stable_and_alphanumeric() {
        let a = LogicalId::from_path("test-website/WebsiteBucket");
        let b = LogicalId::from_path("test-website/WebsiteBucket");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("testwebsiteWebsiteBucket"));
        assert_eq!(a.as_str().len(), "testwebsiteWebsiteBucket".len() + 8);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        // same sanitized text, different path:
        let c = LogicalId::from_path("testwebsite/WebsiteBucket");
        assert_ne!(a, c);
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let mut stack = Stack::new("dup", Environment::default()).unwrap();
        stack.declare("site/Thing", Dummy("a")).unwrap();
        let err = stack.declare("site/Thing", Dummy("b")).unwrap_err();
        assert!(matches!(err, SynthError::DuplicateLogicalId(_)));
    }

    #[test]
    fn environment_values_are_checked() {
        let bad_bucket = Environment {
            staging_bucket: "my bucket; rm -rf /".to_string(),
            ..Environment::default()
        };
        let err = Stack::new("env", bad_bucket).unwrap_err();
        assert!(matches!(err, SynthError::InvalidEnvironment { field: "staging_bucket", .. }));

        let bad_region = Environment {
            region: "us-east-1 $(id)".to_string(),
            ..Environment::default()
        };
        let err = Stack::new("env", bad_region).unwrap_err();
        assert!(matches!(err, SynthError::InvalidEnvironment { field: "region", .. }));

        let bad_key = Environment {
            handler_key: "handlers/a b.zip".to_string(),
            ..Environment::default()
        };
        let err = Stack::new("env", bad_key).unwrap_err();
        assert!(matches!(err, SynthError::InvalidEnvironment { field: "handler_key", .. }));

        let bad_account = Environment {
            account: Some("12ab".to_string()),
            ..Environment::default()
        };
        assert!(Stack::new("env", bad_account).is_err());

        assert!(Stack::new("env", Environment::default()).is_ok());
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let mut stack = Stack::new("outputs", Environment::default()).unwrap();
        let output = || ResourceOutput { description: None, value: json!("a") };
        stack.add_output("siteURL", output()).unwrap();
        let err = stack.add_output("siteURL", output()).unwrap_err();
        assert!(matches!(err, SynthError::DuplicateOutput(ref name) if name == "siteURL"));
        assert_eq!(stack.synth().unwrap().outputs.len(), 1);
    }

    #[test]
    fn invalid_resources_are_rejected() {
        let mut stack = Stack::new("invalid", Environment::default()).unwrap();
        let err = stack.declare("site/Thing", Dummy("")).unwrap_err();
        assert!(err.to_string().contains("Name is required"));
        assert!(stack.synth().unwrap().resources.is_empty());
    }

    #[test]
    fn stack_names_are_validated() {
        assert!(Stack::new("my-site-1", Environment::default()).is_ok());
        assert!(Stack::new("1site", Environment::default()).is_err());
        assert!(Stack::new("my_site", Environment::default()).is_err());
        assert!(Stack::new("", Environment::default()).is_err());
        assert!(Stack::new(&"a".repeat(129), Environment::default()).is_err());
    }

    #[test]
    fn synth_renders_policies_and_dependencies() {
        let mut stack = Stack::new("render", Environment::default()).unwrap();
        let first = stack.declare("site/First", Dummy("first")).unwrap();
        let second = LogicalId::from_path("site/Second");
        let resource = Resource::new(second.clone(), Dummy("second"))
            .with_removal_policy(RemovalPolicy::Destroy)
            .depends_on(&first);
        stack.add_resource(resource).unwrap();
        let template = stack.synth().unwrap();
        let saved = &template.resources[second.as_str()];
        assert_eq!(saved.ty, "Custom::Dummy");
        assert_eq!(saved.deletion_policy.as_deref(), Some("Delete"));
        assert_eq!(saved.update_replace_policy.as_deref(), Some("Delete"));
        assert_eq!(saved.depends_on, vec![first.to_string()]);
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["AWSTemplateFormatVersion"], json!("2010-09-09"));
        assert!(value.get("Outputs").is_none());
        assert!(value["Resources"][first.as_str()].get("DeletionPolicy").is_none());
    }
}
