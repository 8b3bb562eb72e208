use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;
use sitecfn::{BasicSite, CdnSite, CdnSiteOptions, Environment, SiteOptions, Stack, SynthError};

pub const CONFIG_FILE_NAME: &str = "sitecfn.toml";

fn default_region() -> String {
    Environment::default().region
}

/// A site definition file: one stack, any number of sites.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub stack_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub account: Option<String>,
    pub staging_bucket: String,
    #[serde(default)]
    pub handler_key: Option<String>,
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    #[serde(default, rename = "basic_site")]
    pub basic_sites: Vec<BasicSiteEntry>,
    #[serde(default, rename = "cdn_site")]
    pub cdn_sites: Vec<CdnSiteEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BasicSiteEntry {
    pub id: String,
    #[serde(flatten)]
    pub options: SiteOptions,
    /// whatever keys the options did not consume.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
pub struct CdnSiteEntry {
    pub id: String,
    #[serde(flatten)]
    pub options: CdnSiteOptions,
    /// whatever keys the options did not consume.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl SiteConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base_dir).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// parses a config. relative asset folders are resolved against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let mut config: SiteConfig = toml::from_str(text)?;
        if config.basic_sites.is_empty() && config.cdn_sites.is_empty() {
            bail!("No sites defined. Add a [[basic_site]] or [[cdn_site]] table");
        }
        let unknown = config
            .basic_sites
            .iter()
            .map(|s| (&s.id, &s.unknown))
            .chain(config.cdn_sites.iter().map(|s| (&s.id, &s.unknown)));
        for (id, keys) in unknown {
            if let Some(key) = keys.keys().next() {
                bail!("Unknown key '{key}' in site '{id}'");
            }
        }
        let mut seen = HashSet::new();
        let ids = config.basic_sites.iter().map(|s| &s.id).chain(config.cdn_sites.iter().map(|s| &s.id));
        for id in ids {
            if !seen.insert(id.as_str()) {
                bail!("Site id '{id}' is used more than once");
            }
        }
        for site in config.basic_sites.iter_mut() {
            site.options.asset_folder = resolve(base_dir, &site.options.asset_folder);
        }
        for site in config.cdn_sites.iter_mut() {
            site.options.asset_folder = resolve(base_dir, &site.options.asset_folder);
        }
        if let Some(out_dir) = config.out_dir.as_mut() {
            *out_dir = resolve(base_dir, out_dir);
        }
        Ok(config)
    }

    pub fn environment(&self) -> Environment {
        let defaults = Environment::default();
        Environment {
            account: self.account.clone(),
            region: self.region.clone(),
            staging_bucket: self.staging_bucket.clone(),
            handler_key: self.handler_key.clone().unwrap_or(defaults.handler_key),
        }
    }

    /// declares every site into a fresh stack.
    pub fn build_stack(&self) -> Result<Stack, SynthError> {
        let mut stack = Stack::new(&self.stack_name, self.environment())?;
        for site in &self.basic_sites {
            BasicSite::new(&mut stack, &site.id, &site.options)?;
        }
        for site in &self.cdn_sites {
            CdnSite::new(&mut stack, &site.id, &site.options)?;
        }
        Ok(stack)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// given a search dir, see if a config file exists in this dir,
/// and if so return its path. If not found, back up 1 dir at a time
/// until one is found (limit 5 times)
pub fn find_closest_config(mut search_dir: PathBuf) -> Option<PathBuf> {
    for _ in 0..5 {
        search_dir.push(CONFIG_FILE_NAME);
        if search_dir.is_file() {
            return Some(search_dir);
        }
        search_dir.pop();
        if !search_dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecfn::RemovalPolicy;

    const CONFIG: &str = r#"
stack_name = "my-sites"
staging_bucket = "my-staging"

[[basic_site]]
id = "blog"
asset_folder = "public"
index_document = "index.html"
error_document = "404.html"
domain_name = "example.com"
sub_domain_name = "www.example.com"
removal_policy = "destroy"

[[cdn_site]]
id = "docs"
asset_folder = "/srv/docs"
index_document = "index.html"
dns_zone_domain = "example.com"
domain_name = "docs.example.com"
hosted_zone_id = "Z123"
encrypt_at_rest = true
"#;

    #[test]
    fn parses_sites_and_defaults() {
        let config = SiteConfig::parse(CONFIG, Path::new("/work")).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.basic_sites.len(), 1);
        assert_eq!(config.cdn_sites.len(), 1);

        let blog = &config.basic_sites[0];
        assert_eq!(blog.id, "blog");
        assert_eq!(blog.options.asset_folder, PathBuf::from("/work/public"));
        assert_eq!(blog.options.error_document.as_deref(), Some("404.html"));
        assert_eq!(blog.options.removal_policy, RemovalPolicy::Destroy);
        assert!(!blog.options.encrypt_at_rest);

        let docs = &config.cdn_sites[0];
        assert_eq!(docs.options.asset_folder, PathBuf::from("/srv/docs"));
        assert_eq!(docs.options.hosted_zone_id.as_deref(), Some("Z123"));
        assert!(docs.options.encrypt_at_rest);
        assert_eq!(docs.options.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn environment_uses_default_handler_key() {
        let config = SiteConfig::parse(CONFIG, Path::new("/work")).unwrap();
        let env = config.environment();
        assert_eq!(env.staging_bucket, "my-staging");
        assert_eq!(env.handler_key, Environment::default().handler_key);
        assert_eq!(env.account, None);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let text = r#"
stack_name = "s"
staging_bucket = "b"
[[basic_site]]
id = "site"
asset_folder = "a"
index_document = "index.html"
[[basic_site]]
id = "site"
asset_folder = "b"
index_document = "index.html"
"#;
        let err = SiteConfig::parse(text, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_unknown_site_keys() {
        let text = r#"
stack_name = "s"
staging_bucket = "my-staging"
[[basic_site]]
id = "site"
asset_folder = "a"
index_document = "index.html"
encrypt_bucket = true
"#;
        let err = SiteConfig::parse(text, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Unknown key 'encrypt_bucket' in site 'site'"));

        let top_level = r#"
stack_name = "s"
staging_bucket = "my-staging"
regoin = "eu-west-1"
[[basic_site]]
id = "site"
asset_folder = "a"
index_document = "index.html"
"#;
        let err = SiteConfig::parse(top_level, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("regoin"));
    }

    #[test]
    fn invalid_staging_bucket_fails_stack() {
        let text = r#"
stack_name = "s"
staging_bucket = "my staging; echo"
[[basic_site]]
id = "site"
asset_folder = "a"
index_document = "index.html"
"#;
        let config = SiteConfig::parse(text, Path::new(".")).unwrap();
        let err = config.build_stack().unwrap_err();
        assert!(matches!(err, SynthError::InvalidEnvironment { field: "staging_bucket", .. }));
    }

    #[test]
    fn rejects_config_without_sites() {
        let text = "stack_name = \"s\"\nstaging_bucket = \"b\"\n";
        assert!(SiteConfig::parse(text, Path::new(".")).is_err());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let text = r#"
stack_name = "s"
staging_bucket = "b"
[[cdn_site]]
id = "site"
asset_folder = "a"
index_document = "index.html"
domain_name = "www.example.com"
"#;
        assert!(SiteConfig::parse(text, Path::new(".")).is_err());
    }

    #[test]
    fn finds_config_in_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), CONFIG).unwrap();
        let found = find_closest_config(nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn builds_stack_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public").join("index.html"), "hi").unwrap();
        let text = r#"
stack_name = "my-sites"
staging_bucket = "my-staging"
[[basic_site]]
id = "blog"
asset_folder = "public"
index_document = "index.html"
"#;
        let config = SiteConfig::parse(text, dir.path()).unwrap();
        let stack = config.build_stack().unwrap();
        assert_eq!(stack.name(), "my-sites");
        assert_eq!(stack.assets().len(), 1);
        let template = stack.synth().unwrap();
        assert_eq!(template.resources_of_type("AWS::S3::Bucket").count(), 1);
    }
}
