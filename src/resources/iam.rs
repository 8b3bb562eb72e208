use super::*;

pub const LAMBDA_BASIC_EXECUTION_POLICY: &str = "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

pub fn create_assume_role_policy_doc(service: &str) -> PolicyDocument {
    PolicyDocument::new(vec![
        PolicyStatement::allow(&["sts:AssumeRole"], vec![]).with_principal(json!({ "Service": service })),
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRole {
    pub assume_role_policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<String>,
}

impl CfnResource for CfnRole {
    fn type_string(&self) -> &'static str {
        "AWS::IAM::Role"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// An inline policy attached to existing roles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnPolicy {
    pub policy_document: PolicyDocument,
    pub policy_name: String,
    pub roles: Vec<Value>,
}

impl CfnResource for CfnPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::IAM::Policy"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.roles.is_empty() {
            return Err(format!("Policy {} is not attached to any role", self.policy_name));
        }
        if self.policy_document.statement.is_empty() {
            return Err(format!("Policy {} has no statements", self.policy_name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_role_doc_has_no_resource() {
        let doc = create_assume_role_policy_doc("lambda.amazonaws.com");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" }
                }]
            })
        );
    }

    #[test]
    fn detached_policy_is_invalid() {
        let policy = CfnPolicy {
            policy_document: PolicyDocument::new(vec![PolicyStatement::allow(&["s3:GetObject"], vec![json!("*")])]),
            policy_name: "p".to_string(),
            roles: vec![],
        };
        assert!(policy.validate().is_err());
    }
}
