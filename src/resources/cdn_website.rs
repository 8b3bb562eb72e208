use super::*;

/// Options for a website kept in a private bucket and served through
/// CloudFront under a custom domain with TLS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CdnSiteOptions {
    pub asset_folder: PathBuf,
    pub index_document: String,
    /// name of the Route53 hosted zone the certificate is validated in and
    /// the alias record is created in. eg: `example.com`
    pub dns_zone_domain: String,
    /// the domain the site is served on. eg: `www.example.com`
    pub domain_name: String,
    /// id of the hosted zone, without the `/hostedzone/` prefix.
    /// Without it the zone is referenced by name, and ACM validation
    /// records have to be created outside of this stack.
    #[serde(default)]
    pub hosted_zone_id: Option<String>,
    #[serde(default)]
    pub encrypt_at_rest: bool,
    #[serde(default)]
    pub removal_policy: RemovalPolicy,
}

impl CdnSiteOptions {
    pub fn new(asset_folder: impl Into<PathBuf>, index_document: &str, dns_zone_domain: &str, domain_name: &str) -> Self {
        Self {
            asset_folder: asset_folder.into(),
            index_document: index_document.to_string(),
            dns_zone_domain: dns_zone_domain.to_string(),
            domain_name: domain_name.to_string(),
            hosted_zone_id: None,
            encrypt_at_rest: false,
            removal_policy: RemovalPolicy::default(),
        }
    }

    pub fn hosted_zone(&self) -> HostedZone {
        HostedZone::new(&self.dns_zone_domain, self.hosted_zone_id.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct CdnSite {
    pub bucket: LogicalId,
    pub origin_access_identity: LogicalId,
    pub policy: LogicalId,
    pub certificate: LogicalId,
    pub distribution: LogicalId,
    pub deployment: BucketDeployment,
    pub record: LogicalId,
}

impl CdnSite {
    pub fn new<S: Scope>(scope: &mut S, id: &str, options: &CdnSiteOptions) -> Result<Self, SynthError> {
        let zone = options.hosted_zone();
        if !zone.contains(&options.domain_name) {
            warn!(site = id, domain = %options.domain_name, zone = %zone.name, "domain is not inside the hosted zone");
        }
        if scope.env().region != "us-east-1" {
            warn!(site = id, region = %scope.env().region, "cloudfront only accepts certificates issued in us-east-1");
        }

        let bucket = CfnBucket {
            bucket_encryption: options.encrypt_at_rest.then(BucketEncryption::s3_managed),
            public_access_block_configuration: Some(PublicAccessBlockConfiguration::block_all()),
            ..Default::default()
        };
        let bucket = scope.declare_bucket(&format!("{id}/WebsiteBucket"), bucket, options.removal_policy)?;

        let origin_path = format!("{id}/WebsiteDist/Origin1");
        let origin_id = scope.logical_id(&origin_path).to_string();
        let identity = CfnCloudFrontOriginAccessIdentity {
            cloud_front_origin_access_identity_config: OriginAccessIdentityConfig {
                comment: format!("Identity for {origin_id}"),
            },
        };
        let origin_access_identity = scope.declare(&format!("{origin_path}/S3Origin"), identity)?;

        let bucket_arn = bucket.get_att("Arn");
        let policy = CfnBucketPolicy {
            bucket: bucket.get_ref().into(),
            policy_document: PolicyDocument::new(vec![
                PolicyStatement::allow(
                    &["s3:GetObject*", "s3:GetBucket*", "s3:List*"],
                    vec![bucket_arn, objects_arn(&bucket)],
                )
                .with_principal(json!({ "CanonicalUser": origin_access_identity.get_att("S3CanonicalUserId") })),
            ]),
        };
        let policy = scope.declare_bucket_policy(&format!("{id}/Policy"), policy)?;

        let certificate = CfnCertificate::dns_validated(&options.domain_name, &zone);
        let certificate = scope.declare_certificate(&format!("{id}/WebsiteCertificate"), certificate)?;

        let distribution = CfnDistribution {
            distribution_config: DistributionConfig {
                aliases: vec![options.domain_name.clone()],
                comment: None,
                default_cache_behavior: DefaultCacheBehavior::static_content(&origin_id),
                default_root_object: Some(options.index_document.clone()),
                enabled: true,
                http_version: Some("http2".to_string()),
                ipv6_enabled: Some(true),
                origins: vec![Origin::s3_bucket(&origin_id, &bucket, &origin_access_identity)],
                viewer_certificate: Some(ViewerCertificate::sni(&certificate)),
            },
        };
        let distribution = scope.declare_distribution(&format!("{id}/WebsiteDist"), distribution)?;

        let deployment = BucketDeployment::new(
            scope,
            &format!("{id}/WebsiteDeploy"),
            BucketDeploymentProps {
                source: &options.asset_folder,
                destination: &bucket,
                distribution: Some(&distribution),
            },
        )?;

        let record = CfnRecordSet::alias_a(&zone, &options.domain_name, AliasTarget::cloudfront(&distribution));
        let record = scope.declare_dns_record(&format!("{id}/WebsiteAliasRecord"), record)?;

        scope.add_output(
            &output_name(id, "DistributionId"),
            ResourceOutput {
                description: Some(format!("cloudfront distribution of {id}")),
                value: distribution.get_ref(),
            },
        )?;
        scope.add_output(
            &output_name(id, "DistributionDomainName"),
            ResourceOutput {
                description: Some(format!("cloudfront domain name of {id}")),
                value: distribution.get_att("DomainName"),
            },
        )?;

        Ok(Self {
            bucket,
            origin_access_identity,
            policy,
            certificate,
            distribution,
            deployment,
            record,
        })
    }
}
