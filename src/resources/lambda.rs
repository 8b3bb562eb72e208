use super::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    pub s3_bucket: StrVal,
    pub s3_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnFunction {
    pub code: Code,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,
    pub role: StrVal,
    pub runtime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl CfnResource for CfnFunction {
    fn type_string(&self) -> &'static str {
        "AWS::Lambda::Function"
    }

    fn properties(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(timeout) = self.timeout {
            if !(1..=900).contains(&timeout) {
                return Err(format!("Lambda timeout must be between 1 and 900 seconds, found {timeout}"));
            }
        }
        if let Some(memory) = self.memory_size {
            if !(128..=10240).contains(&memory) {
                return Err(format!("Lambda memory size must be between 128 and 10240 MB, found {memory}"));
            }
        }
        if self.code.s3_key.is_empty() {
            return Err("Lambda code must point at an S3 key".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function() -> CfnFunction {
        CfnFunction {
            code: Code {
                s3_bucket: "staging".into(),
                s3_key: "handlers/bucket-deployment.zip".to_string(),
            },
            description: None,
            handler: "index.handler".to_string(),
            memory_size: Some(128),
            role: get_att("Role", "Arn").into(),
            runtime: "python3.11".to_string(),
            timeout: Some(900),
        }
    }

    #[test]
    fn renders_s3_code() {
        let props = function().properties().unwrap();
        assert_eq!(props["Code"], json!({ "S3Bucket": "staging", "S3Key": "handlers/bucket-deployment.zip" }));
        assert_eq!(props["Role"], json!({ "Fn::GetAtt": ["Role", "Arn"] }));
        assert!(props.get("Description").is_none());
    }

    #[test]
    fn limits_are_checked() {
        let mut f = function();
        assert!(f.validate().is_ok());
        f.timeout = Some(901);
        assert!(f.validate().is_err());
        f.timeout = None;
        f.memory_size = Some(64);
        assert!(f.validate().is_err());
    }
}
