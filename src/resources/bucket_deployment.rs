use super::*;

/// construct paths of the handler shared by every deployment in a stack.
const HANDLER_ROLE_PATH: &str = "Custom::CDKBucketDeployment/ServiceRole";
const HANDLER_FUNCTION_PATH: &str = "Custom::CDKBucketDeployment/Handler";

/// The custom resource that, at deploy time, unzips a staged asset into
/// its destination bucket and optionally invalidates a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnBucketDeployment {
    pub service_token: Value,
    pub source_bucket_names: Vec<StrVal>,
    pub source_object_keys: Vec<String>,
    pub destination_bucket_name: StrVal,
    pub prune: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<StrVal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub distribution_paths: Vec<String>,
}

impl CfnResource for CfnBucketDeployment {
    fn type_string(&self) -> &'static str {
        "Custom::CDKBucketDeployment"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.source_bucket_names.len() != self.source_object_keys.len() {
            return Err("Every deployment source needs both a bucket and an object key".to_string());
        }
        if !self.distribution_paths.is_empty() && self.distribution_id.is_none() {
            return Err("Distribution paths were given without a distribution to invalidate".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BucketDeploymentProps<'a> {
    /// local folder copied into the bucket.
    pub source: &'a Path,
    pub destination: &'a LogicalId,
    /// when set, `/*` is invalidated on this distribution after the upload.
    pub distribution: Option<&'a LogicalId>,
}

#[derive(Debug, Clone)]
pub struct BucketDeployment {
    pub id: LogicalId,
    pub asset: Asset,
    pub handler: LogicalId,
    pub policy: LogicalId,
}

impl BucketDeployment {
    pub fn new<S: Scope>(scope: &mut S, path: &str, props: BucketDeploymentProps<'_>) -> Result<Self, SynthError> {
        let asset = scope.stage_asset(props.source)?;
        let (role, handler) = ensure_handler(scope)?;

        let staging = get_ref(STAGING_BUCKET_PARAM);
        let staging_arn = join("", vec![json!("arn:aws:s3:::"), staging.clone()]);
        let staging_objects = join("", vec![json!("arn:aws:s3:::"), staging.clone(), json!("/*")]);
        let destination = props.destination;
        let mut statements = vec![
            PolicyStatement::allow(
                &["s3:GetObject*", "s3:GetBucket*", "s3:List*"],
                vec![staging_arn, staging_objects],
            ),
            PolicyStatement::allow(
                &[
                    "s3:GetObject*", "s3:GetBucket*", "s3:List*",
                    "s3:DeleteObject*", "s3:PutObject", "s3:PutObjectTagging", "s3:Abort*",
                ],
                vec![destination.get_att("Arn"), objects_arn(destination)],
            ),
        ];
        if props.distribution.is_some() {
            statements.push(PolicyStatement::allow(
                &["cloudfront:GetInvalidation", "cloudfront:CreateInvalidation"],
                vec![json!("*")],
            ));
        }
        let policy_id = scope.logical_id(&format!("{path}/HandlerPolicy"));
        let policy = CfnPolicy {
            policy_document: PolicyDocument::new(statements),
            policy_name: policy_id.to_string(),
            roles: vec![role.get_ref()],
        };
        let policy = scope.add_resource(Resource::new(policy_id, policy))?;

        let deployment = CfnBucketDeployment {
            service_token: handler.get_att("Arn"),
            source_bucket_names: vec![staging.into()],
            source_object_keys: vec![asset.object_key.clone()],
            destination_bucket_name: destination.get_ref().into(),
            prune: true,
            distribution_id: props.distribution.map(|d| d.get_ref().into()),
            distribution_paths: match props.distribution {
                Some(_) => vec!["/*".to_string()],
                None => vec![],
            },
        };
        let id = scope.logical_id(path);
        // the handler must be able to read/write before the custom resource runs.
        let id = scope.add_resource(Resource::new(id, deployment).depends_on(&policy))?;
        Ok(Self { id, asset, handler, policy })
    }
}

/// declares the singleton handler role + function the first time a stack
/// needs them, returns their logical ids.
fn ensure_handler<S: Scope>(scope: &mut S) -> Result<(LogicalId, LogicalId), SynthError> {
    let role = scope.logical_id(HANDLER_ROLE_PATH);
    let function = scope.logical_id(HANDLER_FUNCTION_PATH);
    if scope.contains(&function) {
        return Ok((role, function));
    }
    let role_resource = CfnRole {
        assume_role_policy_document: create_assume_role_policy_doc("lambda.amazonaws.com"),
        description: Some("auto generated role for bucket deployments".to_string()),
        managed_policy_arns: vec![LAMBDA_BASIC_EXECUTION_POLICY.to_string()],
    };
    let role = scope.add_resource(Resource::new(role, role_resource))?;
    let handler_key = scope.env().handler_key.clone();
    let function_resource = CfnFunction {
        code: Code {
            s3_bucket: get_ref(STAGING_BUCKET_PARAM).into(),
            s3_key: handler_key,
        },
        description: Some("copies staged assets into website buckets".to_string()),
        handler: "index.handler".to_string(),
        memory_size: Some(128),
        role: role.get_att("Arn").into(),
        runtime: "python3.11".to_string(),
        timeout: Some(900),
    };
    let function = scope.add_resource(Resource::new(function, function_resource).depends_on(&role))?;
    Ok((role, function))
}
