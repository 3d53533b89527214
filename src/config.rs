//! Deployment configuration
//!
//! Loaded from a `geodeploy.toml` next to the invocation (or a path given
//! with `--config`); every field has a default matching the production
//! deployment, so a bare checkout works against the real bucket.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

fn default_bucket() -> String {
    "mf-geoadmin3".to_string()
}

fn default_host() -> String {
    "s3.amazonaws.com".to_string()
}

fn default_languages() -> Vec<String> {
    ["de", "fr", "it", "rm", "en"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Admin profile derived from the invoking user, `<user>_aws_admin`
fn default_profile() -> Option<String> {
    std::env::var("USER")
        .ok()
        .map(|user| format!("{}_aws_admin", user))
}

/// Settings for one target bucket
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Bucket holding every deployed version
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// AWS credentials profile; defaults to `<user>_aws_admin`
    #[serde(default = "default_profile")]
    pub profile: Option<String>,

    /// Explicit region override
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint (tests, S3-compatible stores); switches the client
    /// to path-style addressing
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Host used when printing public check URLs
    #[serde(default = "default_host")]
    pub public_host: String,

    /// Languages with a `layersConfig.<lang>.json` document
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            bucket: default_bucket(),
            profile: default_profile(),
            region: None,
            endpoint: None,
            public_host: default_host(),
            languages: default_languages(),
        }
    }
}

impl DeployConfig {
    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load `path` if given, `geodeploy.toml` if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::from_file(explicit),
            None => {
                let implicit = Path::new("geodeploy.toml");
                if implicit.is_file() {
                    Self::from_file(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Public website URL for a key, for "please check it on ..." output.
    pub fn object_url(&self, key: &str) -> String {
        format!("http://{}.{}/{}", self.bucket, self.public_host, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production() {
        let config = DeployConfig::default();
        assert_eq!(config.bucket, "mf-geoadmin3");
        assert_eq!(config.languages, vec!["de", "fr", "it", "rm", "en"]);
        assert_eq!(config.public_host, "s3.amazonaws.com");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DeployConfig = toml::from_str("bucket = \"test-bucket\"").unwrap();
        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.languages.len(), 5);
        assert_eq!(config.region, None);
    }

    #[test]
    fn test_full_toml() {
        let config: DeployConfig = toml::from_str(
            r#"
            bucket = "staging-bucket"
            profile = "ci_deploy"
            region = "eu-central-1"
            endpoint = "http://localhost:9000"
            public_host = "example.org"
            languages = ["de", "fr"]
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket, "staging-bucket");
        assert_eq!(config.profile.as_deref(), Some("ci_deploy"));
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.languages, vec!["de", "fr"]);
    }

    #[test]
    fn test_object_url() {
        let config = DeployConfig::default();
        assert_eq!(
            config.object_url("index.12.html"),
            "http://mf-geoadmin3.s3.amazonaws.com/index.12.html"
        );
    }
}
