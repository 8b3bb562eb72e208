use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: OneOrMany<String>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany<Value>>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: Vec<Value>) -> Self {
        let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        Self {
            action: actions.into(),
            effect: Effect::Allow,
            principal: None,
            resource: if resources.is_empty() { None } else { Some(resources.into()) },
        }
    }

    pub fn with_principal(mut self, principal: Value) -> Self {
        self.principal = Some(principal);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: "2012-10-17".to_string(),
            statement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnBucketPolicy {
    pub bucket: StrVal,
    pub policy_document: PolicyDocument,
}

impl CfnResource for CfnBucketPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::S3::BucketPolicy"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.policy_document.statement.is_empty() {
            return Err("A bucket policy needs at least one statement".to_string());
        }
        Ok(())
    }
}

/// `<bucket arn>/*`, every object in the bucket.
pub fn objects_arn(bucket: &LogicalId) -> Value {
    join("", vec![bucket.get_att("Arn"), Value::String("/*".to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_read_statement() {
        let bucket = LogicalId::from_path("site/WebsiteBucket");
        let policy = CfnBucketPolicy {
            bucket: bucket.get_ref().into(),
            policy_document: PolicyDocument::new(vec![
                PolicyStatement::allow(&["s3:GetObject"], vec![objects_arn(&bucket)]).with_principal(json!("*")),
            ]),
        };
        let props = policy.properties().unwrap();
        assert_eq!(props["Bucket"], json!({ "Ref": bucket.as_str() }));
        assert_eq!(
            props["PolicyDocument"],
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "s3:GetObject",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Resource": { "Fn::Join": ["", [{ "Fn::GetAtt": [bucket.as_str(), "Arn"] }, "/*"]] }
                }]
            })
        );
    }

    #[test]
    fn empty_policy_is_invalid() {
        let policy = CfnBucketPolicy {
            bucket: "bucket".into(),
            policy_document: PolicyDocument::new(vec![]),
        };
        assert!(policy.validate().is_err());
    }
}
