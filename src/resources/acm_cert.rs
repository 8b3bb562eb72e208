use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationMethod {
    Dns,
    Email,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainValidationOption {
    pub domain_name: String,
    pub hosted_zone_id: String,
}

/// An ACM certificate. Only DNS validation against a Route53 zone in the
/// same account is supported here; the validation records are created by
/// ACM itself when the zone id is given.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnCertificate {
    /// the domain you're requesting a certificate for. Must be fully qualified. Can have 1 optional wildcard.
    /// Examples of valid values:
    /// - www.mysite.com
    /// - multiple.sub.domains.mysite.com
    /// - mysite.com
    /// - *.mysite.com
    /// Examples of invalid values:
    /// - *.something.*.mysite.com
    /// - cannotendwithdot.com.
    pub domain_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain_validation_options: Vec<DomainValidationOption>,
    pub validation_method: ValidationMethod,
}

impl CfnCertificate {
    pub fn dns_validated(domain_name: &str, zone: &HostedZone) -> Self {
        let domain_validation_options = match &zone.id {
            Some(id) => vec![DomainValidationOption {
                domain_name: domain_name.to_string(),
                hosted_zone_id: id.clone(),
            }],
            None => vec![],
        };
        Self {
            domain_name: domain_name.to_string(),
            domain_validation_options,
            validation_method: ValidationMethod::Dns,
        }
    }
}

impl CfnResource for CfnCertificate {
    fn type_string(&self) -> &'static str {
        "AWS::CertificateManager::Certificate"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        let domain = &self.domain_name;
        if domain.is_empty() {
            return Err("Must provide a domain name".to_string());
        }
        if domain.ends_with('.') {
            return Err(format!("Certificate domain cannot end with a dot. {domain} is invalid."));
        }
        if domain.contains('*') {
            if domain.matches('*').count() > 1 {
                return Err(format!("Must only provide 1 wildcard. {domain} is invalid."));
            }
            if !domain.starts_with("*.") {
                return Err(format!("If using a wildcard, it must be the first component of your domain, eg: \"*.something.com\". {domain} is invalid."));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cert(domain: &str) -> CfnCertificate {
        CfnCertificate::dns_validated(domain, &HostedZone::new("example.com", None))
    }

    #[test]
    fn wildcard_rules() {
        assert!(cert("www.example.com").validate().is_ok());
        assert!(cert("*.example.com").validate().is_ok());
        assert!(cert("").validate().is_err());
        assert!(cert("*.sub.*.example.com").validate().unwrap_err().contains("1 wildcard"));
        assert!(cert("www.*.example.com").validate().unwrap_err().contains("first component"));
        assert!(cert("example.com.").validate().is_err());
    }

    #[test]
    fn zone_id_adds_validation_options() {
        let props = cert("www.example.com").properties().unwrap();
        assert_eq!(props, json!({ "DomainName": "www.example.com", "ValidationMethod": "DNS" }));

        let with_id = CfnCertificate::dns_validated("www.example.com", &HostedZone::new("example.com", Some("Z123")));
        let props = with_id.properties().unwrap();
        assert_eq!(
            props["DomainValidationOptions"],
            json!([{ "DomainName": "www.example.com", "HostedZoneId": "Z123" }])
        );
    }
}
