use super::*;

/// Options for a website served straight out of a public S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteOptions {
    /// local folder whose contents are uploaded to the bucket.
    pub asset_folder: PathBuf,
    pub index_document: String,
    #[serde(default)]
    pub error_document: Option<String>,
    /// when set, the bucket is named after the domain so it can serve
    /// the naked domain directly.
    #[serde(default)]
    pub domain_name: Option<String>,
    /// when set together with `domain_name`, a second bucket with this
    /// name redirects every request to `domain_name`.
    #[serde(default)]
    pub sub_domain_name: Option<String>,
    #[serde(default)]
    pub encrypt_at_rest: bool,
    #[serde(default)]
    pub removal_policy: RemovalPolicy,
}

impl SiteOptions {
    pub fn new(asset_folder: impl Into<PathBuf>, index_document: &str) -> Self {
        Self {
            asset_folder: asset_folder.into(),
            index_document: index_document.to_string(),
            error_document: None,
            domain_name: None,
            sub_domain_name: None,
            encrypt_at_rest: false,
            removal_policy: RemovalPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BasicSite {
    pub bucket: LogicalId,
    pub policy: LogicalId,
    pub deployment: BucketDeployment,
    pub redirect_bucket: Option<LogicalId>,
}

impl BasicSite {
    pub fn new<S: Scope>(scope: &mut S, id: &str, options: &SiteOptions) -> Result<Self, SynthError> {
        let bucket = CfnBucket {
            bucket_name: options.domain_name.clone(),
            bucket_encryption: options.encrypt_at_rest.then(BucketEncryption::s3_managed),
            public_access_block_configuration: Some(PublicAccessBlockConfiguration::allow_public_policy()),
            website_configuration: Some(WebsiteConfiguration::hosting(
                &options.index_document,
                options.error_document.as_deref(),
            )),
        };
        let bucket = scope.declare_bucket(&format!("{id}/WebsiteBucket"), bucket, options.removal_policy)?;

        let policy = CfnBucketPolicy {
            bucket: bucket.get_ref().into(),
            policy_document: PolicyDocument::new(vec![
                PolicyStatement::allow(&["s3:GetObject"], vec![objects_arn(&bucket)]).with_principal(json!("*")),
            ]),
        };
        let policy = scope.declare_bucket_policy(&format!("{id}/Policy"), policy)?;

        let deployment = BucketDeployment::new(
            scope,
            &format!("{id}/WebsiteDeploy"),
            BucketDeploymentProps {
                source: &options.asset_folder,
                destination: &bucket,
                distribution: None,
            },
        )?;

        let redirect_bucket = match (&options.domain_name, &options.sub_domain_name) {
            (Some(domain), Some(sub_domain)) => {
                let redirect = CfnBucket {
                    bucket_name: Some(sub_domain.clone()),
                    website_configuration: Some(WebsiteConfiguration::redirect_to(domain, RedirectProtocol::Http)),
                    ..Default::default()
                };
                let path = format!("{id}/WebsiteRedirectBucket");
                Some(scope.declare_bucket(&path, redirect, options.removal_policy)?)
            }
            (None, Some(sub_domain)) => {
                warn!(site = id, sub_domain = %sub_domain, "sub domain given without a domain to redirect to, skipping redirect bucket");
                None
            }
            _ => None,
        };

        let site = Self { bucket, policy, deployment, redirect_bucket };
        scope.add_output(
            &output_name(id, "WebsiteURL"),
            ResourceOutput {
                description: Some(format!("website endpoint of {id}")),
                value: site.website_url(),
            },
        )?;
        Ok(site)
    }

    pub fn website_url(&self) -> Value {
        self.bucket.get_att("WebsiteURL")
    }
}
