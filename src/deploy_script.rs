use crate::stack::{Environment, STAGING_BUCKET_PARAM};

/// single quotes a value for bash.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Renders a bash script that uploads the packaged assets to the staging
/// bucket and deploys the template. Paths are relative to the directory
/// the script lives in.
pub fn render_deploy_script(stack_name: &str, env: &Environment, template_file: &str, assets_dir: &str) -> String {
    let region = quote(&env.region);
    let bucket = &env.staging_bucket;
    let handler_key = quote(&env.handler_key);
    let stack_name = quote(stack_name);
    let local_assets = quote(&format!("./{assets_dir}/"));
    let remote_assets = quote(&format!("s3://{bucket}/{assets_dir}/"));
    let handler_uri = quote(&format!("s3://{bucket}/{}", env.handler_key));
    let template = quote(&format!("./{template_file}"));
    let overrides = quote(&format!("{STAGING_BUCKET_PARAM}={bucket}"));
    let bucket = quote(bucket);

    let mut out = String::new();
    out.push_str("#!/usr/bin/env bash\n");
    out.push_str("set -euo pipefail\n");
    out.push_str("cd \"$(dirname \"$0\")\"\n\n");

    out.push_str("# package:\n");
    out.push_str(&format!("aws s3 sync --size-only {local_assets} {remote_assets}\n"));
    out.push_str(&format!(
        "aws s3api head-object --bucket {bucket} --key {handler_key} > /dev/null || {{ echo missing deployment handler {handler_uri} >&2; exit 1; }}\n\n"
    ));

    out.push_str("# deploy:\n");
    out.push_str(&format!(
        "AWS_REGION={region} aws --region {region} cloudformation deploy --stack-name {stack_name} --template-file {template} --capabilities CAPABILITY_NAMED_IAM --parameter-overrides {overrides}\n"
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_syncs_then_deploys() {
        let env = Environment {
            region: "eu-west-1".to_string(),
            staging_bucket: "my-staging".to_string(),
            ..Environment::default()
        };
        let script = render_deploy_script("my-site", &env, "template.json", "assets");
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        let sync = script.find("aws s3 sync --size-only './assets/' 's3://my-staging/assets/'").unwrap();
        let deploy = script.find("cloudformation deploy --stack-name 'my-site'").unwrap();
        assert!(sync < deploy);
        assert!(script.contains("AWS_REGION='eu-west-1' aws --region 'eu-west-1'"));
        assert!(script.contains("--template-file './template.json'"));
        assert!(script.contains("--parameter-overrides 'StagingBucketName=my-staging'"));
        assert!(script.contains("--bucket 'my-staging' --key 'handlers/bucket-deployment.zip'"));
    }

    #[test]
    fn values_cannot_break_out_of_quotes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("a b; rm -rf /"), "'a b; rm -rf /'");
        assert_eq!(quote("it's"), r"'it'\''s'");

        let env = Environment {
            handler_key: "handlers/$(id)'.zip".to_string(),
            ..Environment::default()
        };
        let script = render_deploy_script("my-site", &env, "template.json", "assets");
        assert!(script.contains(r"--key 'handlers/$(id)'\''.zip'"));
        assert!(!script.contains(" $(id)"));
    }
}
