use super::*;

/// this is static for all of AWS for aliases to CloudFront
/// see here: https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-properties-route53-aliastarget.html#cfn-route53-aliastarget-hostedzoneid
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// A Route53 hosted zone, known by name and optionally by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub name: String,
    pub id: Option<String>,
}

impl HostedZone {
    pub fn new(name: &str, id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            id: id.map(str::to_string),
        }
    }

    /// whether `domain` is the zone apex or a name inside the zone.
    pub fn contains(&self, domain: &str) -> bool {
        let zone = self.name.trim_end_matches('.');
        let domain = domain.trim_end_matches('.');
        domain == zone || domain.ends_with(&format!(".{zone}"))
    }
}

/// hosted zone and record names must end in .
pub fn fully_qualified(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTarget {
    #[serde(rename = "DNSName")]
    pub dns_name: StrVal,
    pub hosted_zone_id: String,
}

impl AliasTarget {
    pub fn cloudfront(distribution: &LogicalId) -> Self {
        Self {
            dns_name: distribution.get_att("DomainName").into(),
            hosted_zone_id: CLOUDFRONT_HOSTED_ZONE_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRecordSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_name: Option<String>,
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
}

impl CfnRecordSet {
    /// an A record aliasing `name` to some AWS managed endpoint in `zone`.
    pub fn alias_a(zone: &HostedZone, name: &str, target: AliasTarget) -> Self {
        let (hosted_zone_id, hosted_zone_name) = match &zone.id {
            Some(id) => (Some(id.clone()), None),
            None => (None, Some(fully_qualified(&zone.name))),
        };
        Self {
            alias_target: Some(target),
            comment: None,
            hosted_zone_id,
            hosted_zone_name,
            name: fully_qualified(name),
            record_type: "A".to_string(),
        }
    }
}

impl CfnResource for CfnRecordSet {
    fn type_string(&self) -> &'static str {
        "AWS::Route53::RecordSet"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Route53 record must have a name. Example mysubdomain.mywebsite.com".to_string());
        }
        match (&self.hosted_zone_id, &self.hosted_zone_name) {
            (Some(_), Some(_)) => Err("Route53 record must reference its hosted zone by id or by name, not both".to_string()),
            (None, None) => Err(format!("Route53 record {} is missing its hosted zone", self.name)),
            _ => Ok(()),
        }
    }
}
