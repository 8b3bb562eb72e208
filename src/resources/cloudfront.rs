use super::*;

/// managed "CachingOptimized" policy:
/// https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/using-managed-cache-policies.html#managed-cache-caching-optimized
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

pub const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1.2_2019";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnCloudFrontOriginAccessIdentity {
    pub cloud_front_origin_access_identity_config: OriginAccessIdentityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginAccessIdentityConfig {
    pub comment: String,
}

impl CfnResource for CfnCloudFrontOriginAccessIdentity {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::CloudFrontOriginAccessIdentity"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DefaultCacheBehavior {
    pub allowed_methods: Vec<String>,
    pub cached_methods: Vec<String>,
    pub cache_policy_id: String,
    pub compress: bool,
    pub target_origin_id: String,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
}

impl DefaultCacheBehavior {
    /// GET/HEAD/OPTIONS allowed, GET/HEAD cached, caching optimized,
    /// viewers redirected to https.
    pub fn static_content(target_origin_id: &str) -> Self {
        Self {
            allowed_methods: vec!["GET".into(), "HEAD".into(), "OPTIONS".into()],
            cached_methods: vec!["GET".into(), "HEAD".into()],
            cache_policy_id: CACHING_OPTIMIZED_POLICY_ID.to_string(),
            compress: true,
            target_origin_id: target_origin_id.to_string(),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3OriginConfig {
    pub origin_access_identity: StrVal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Origin {
    pub domain_name: StrVal,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_origin_config: Option<S3OriginConfig>,
}

impl Origin {
    /// an origin that reads the bucket through an origin access identity,
    /// so the bucket itself can stay private.
    pub fn s3_bucket(id: &str, bucket: &LogicalId, identity: &LogicalId) -> Self {
        let identity_path = join(
            "",
            vec![Value::String("origin-access-identity/cloudfront/".to_string()), identity.get_ref()],
        );
        Self {
            domain_name: bucket.get_att("RegionalDomainName").into(),
            id: id.to_string(),
            s3_origin_config: Some(S3OriginConfig {
                origin_access_identity: identity_path.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewerCertificate {
    pub acm_certificate_arn: StrVal,
    pub minimum_protocol_version: String,
    pub ssl_support_method: String,
}

impl ViewerCertificate {
    pub fn sni(certificate: &LogicalId) -> Self {
        Self {
            acm_certificate_arn: certificate.get_ref().into(),
            minimum_protocol_version: MINIMUM_PROTOCOL_VERSION.to_string(),
            ssl_support_method: "sni-only".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DistributionConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub default_cache_behavior: DefaultCacheBehavior,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_version: Option<String>,
    #[serde(rename = "IPV6Enabled", skip_serializing_if = "Option::is_none")]
    pub ipv6_enabled: Option<bool>,
    pub origins: Vec<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_certificate: Option<ViewerCertificate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnDistribution {
    pub distribution_config: DistributionConfig,
}

impl CfnResource for CfnDistribution {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Distribution"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        let conf = &self.distribution_config;
        if conf.origins.is_empty() {
            return Err("Must provide at least one origin to cloudfront distribution".to_string());
        }
        let target = &conf.default_cache_behavior.target_origin_id;
        if !conf.origins.iter().any(|o| &o.id == target) {
            return Err(format!("Default cache behavior targets origin '{target}' which is not one of the distribution origins"));
        }
        if !conf.aliases.is_empty() && conf.viewer_certificate.is_none() {
            return Err("A distribution with aliases needs a viewer certificate covering them".to_string());
        }
        Ok(())
    }
}
