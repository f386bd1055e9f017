//! Plugin options: raw surface, defaults, and resolution
//!
//! [`RawOptions`] is the serde-facing surface a host hands us (camelCase keys,
//! everything optional). [`RawOptions::resolve`] merges defaults, validates,
//! and produces the immutable [`Options`] record shared by the whole run.
//!
//! Resolution validates shape only; the network reachability probe on the
//! base URL happens in the pipeline right after the HTTP client is built,
//! before anything else is fetched, and fails with the same option error.

use crate::error::{IngestError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

pub const DEFAULT_SITEMAP_ROUTE: &str = "sitemap";
pub const DEFAULT_GLOBAL_DATA_ROUTE: &str = "globaldata";
pub const DEFAULT_FOREIGN_KEY_SUFFIX: &str = "___ID";
pub const DEFAULT_REMOTE_FILE_SUFFIX: &str = "___FILE";
pub const DEFAULT_COMMON_INTERFACE_NAME: &str = "CmsNode";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_image_keys() -> Vec<String> {
    vec!["image".to_string()]
}

fn default_interface_fields() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("name".to_string(), "String".to_string()),
        ("slug".to_string(), "String".to_string()),
    ])
}

/// Unresolved options as provided by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawOptions {
    /// Base URL of the CMS API (required, must be reachable)
    pub url: Option<String>,
    pub sitemap_route: Option<String>,
    pub global_data_route: Option<String>,
    pub type_prefix: Option<String>,
    pub foreign_key_suffix: Option<String>,
    pub remote_file_suffix: Option<String>,
    /// Legacy variant: exact key names treated as image URLs
    pub image_keys: Option<Vec<String>>,
    pub common_interface: Option<RawCommonInterface>,
    pub timeout_secs: Option<u64>,
    /// Injected by some host frameworks; discarded during resolution
    pub plugins: Option<serde_json::Value>,
}

/// Unresolved `commonInterface` block; merged one level deep.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCommonInterface {
    pub name: Option<String>,
    pub fields: Option<BTreeMap<String, String>>,
}

/// The shared interface declared over all discovered content types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonInterface {
    pub name: String,
    /// Extra interface fields as GraphQL `name -> type` pairs
    pub fields: BTreeMap<String, String>,
}

/// Resolved, validated options; immutable for the whole run.
#[derive(Debug, Clone)]
pub struct Options {
    pub url: Url,
    pub sitemap_route: String,
    pub global_data_route: String,
    pub type_prefix: String,
    pub foreign_key_suffix: String,
    pub remote_file_suffix: String,
    pub image_keys: Vec<String>,
    pub common_interface: CommonInterface,
    pub timeout_secs: u64,
}

impl RawOptions {
    /// Merge defaults and validate, failing fast on the first bad option.
    pub fn resolve(mut self) -> Result<Options> {
        self.plugins = None;

        let url = match self.url.as_deref().map(Url::parse) {
            Some(Ok(url)) => url,
            _ => {
                return Err(invalid_option(
                    "url",
                    "missing, invalid, or not reachable",
                    render_opt(self.url.as_ref()),
                ))
            },
        };

        let sitemap_route = self
            .sitemap_route
            .unwrap_or_else(|| DEFAULT_SITEMAP_ROUTE.to_string());
        if !is_valid_route(&sitemap_route, &url) {
            return Err(invalid_option("sitemapRoute", "invalid", render(&sitemap_route)));
        }

        let global_data_route = self
            .global_data_route
            .unwrap_or_else(|| DEFAULT_GLOBAL_DATA_ROUTE.to_string());
        if !is_valid_route(&global_data_route, &url) {
            return Err(invalid_option(
                "globalDataRoute",
                "invalid",
                render(&global_data_route),
            ));
        }

        let image_keys = self.image_keys.unwrap_or_else(default_image_keys);
        if image_keys.iter().any(|key| key.is_empty()) {
            return Err(invalid_option("imageKeys", "invalid", render(&image_keys)));
        }

        let foreign_key_suffix = self
            .foreign_key_suffix
            .unwrap_or_else(|| DEFAULT_FOREIGN_KEY_SUFFIX.to_string());
        if foreign_key_suffix.is_empty() {
            return Err(invalid_option(
                "foreignKeySuffix",
                "invalid (must be a non-empty string)",
                render(&foreign_key_suffix),
            ));
        }

        let remote_file_suffix = self
            .remote_file_suffix
            .unwrap_or_else(|| DEFAULT_REMOTE_FILE_SUFFIX.to_string());
        if remote_file_suffix.is_empty() {
            return Err(invalid_option(
                "remoteFileSuffix",
                "invalid (must be a non-empty string)",
                render(&remote_file_suffix),
            ));
        }

        // The two passes must own disjoint key sets: a key may never end in
        // both suffixes.
        if foreign_key_suffix.ends_with(&remote_file_suffix)
            || remote_file_suffix.ends_with(&foreign_key_suffix)
        {
            return Err(invalid_option(
                "remoteFileSuffix",
                "invalid (must not overlap with foreignKeySuffix)",
                render(&remote_file_suffix),
            ));
        }

        let common_interface = resolve_common_interface(self.common_interface.unwrap_or_default())?;

        Ok(Options {
            url,
            sitemap_route,
            global_data_route,
            type_prefix: self.type_prefix.unwrap_or_default(),
            foreign_key_suffix,
            remote_file_suffix,
            image_keys,
            common_interface,
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

fn resolve_common_interface(raw: RawCommonInterface) -> Result<CommonInterface> {
    let name = raw
        .name
        .unwrap_or_else(|| DEFAULT_COMMON_INTERFACE_NAME.to_string());
    if name.is_empty() {
        return Err(invalid_option("commonInterface.name", "invalid", render(&name)));
    }

    let fields = raw.fields.unwrap_or_else(default_interface_fields);
    if fields.values().any(|type_name| type_name.is_empty()) {
        return Err(invalid_option("commonInterface.fields", "invalid", render(&fields)));
    }

    Ok(CommonInterface { name, fields })
}

/// A route is valid when it parses as a URL on its own or against the base.
fn is_valid_route(route: &str, base: &Url) -> bool {
    Url::parse(route).is_ok() || base.join(route).is_ok()
}

fn invalid_option(option: &'static str, problem: &str, value: String) -> IngestError {
    IngestError::Option {
        option,
        problem: problem.to_string(),
        value,
    }
}

fn render<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "undefined".to_string())
}

fn render_opt<T: serde::Serialize>(value: Option<&T>) -> String {
    match value {
        Some(value) => render(value),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RawOptions {
        RawOptions {
            url: Some("http://cms.example.com/api".to_string()),
            ..RawOptions::default()
        }
    }

    #[test]
    fn applies_defaults() {
        let options = minimal().resolve().unwrap();

        assert_eq!(options.sitemap_route, "sitemap");
        assert_eq!(options.global_data_route, "globaldata");
        assert_eq!(options.type_prefix, "");
        assert_eq!(options.foreign_key_suffix, "___ID");
        assert_eq!(options.remote_file_suffix, "___FILE");
        assert_eq!(options.image_keys, ["image"]);
        assert_eq!(options.common_interface.name, "CmsNode");
        assert_eq!(options.common_interface.fields.len(), 2);
        assert_eq!(options.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn missing_url_fails() {
        let err = RawOptions::default().resolve().unwrap_err();
        assert!(err.to_string().contains("[url]"));
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn unparseable_url_fails() {
        let raw = RawOptions {
            url: Some("not a url".to_string()),
            ..RawOptions::default()
        };
        let err = raw.resolve().unwrap_err();
        assert!(err.to_string().contains("[url]"));
    }

    #[test]
    fn empty_suffixes_fail() {
        let raw = RawOptions {
            foreign_key_suffix: Some(String::new()),
            ..minimal()
        };
        assert!(raw.resolve().unwrap_err().to_string().contains("[foreignKeySuffix]"));

        let raw = RawOptions {
            remote_file_suffix: Some(String::new()),
            ..minimal()
        };
        assert!(raw.resolve().unwrap_err().to_string().contains("[remoteFileSuffix]"));
    }

    #[test]
    fn overlapping_suffixes_fail() {
        let raw = RawOptions {
            foreign_key_suffix: Some("___REF".to_string()),
            remote_file_suffix: Some("REF".to_string()),
            ..minimal()
        };
        let err = raw.resolve().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn empty_image_key_fails() {
        let raw = RawOptions {
            image_keys: Some(vec!["image".to_string(), String::new()]),
            ..minimal()
        };
        assert!(raw.resolve().unwrap_err().to_string().contains("[imageKeys]"));
    }

    #[test]
    fn common_interface_merges_one_level_deep() {
        let raw = RawOptions {
            common_interface: Some(RawCommonInterface {
                name: Some("SiteNode".to_string()),
                fields: None,
            }),
            ..minimal()
        };
        let options = raw.resolve().unwrap();

        // Name overridden, fields still defaulted.
        assert_eq!(options.common_interface.name, "SiteNode");
        assert!(options.common_interface.fields.contains_key("slug"));
    }

    #[test]
    fn empty_interface_field_type_fails() {
        let raw = RawOptions {
            common_interface: Some(RawCommonInterface {
                name: None,
                fields: Some(BTreeMap::from([("broken".to_string(), String::new())])),
            }),
            ..minimal()
        };
        let err = raw.resolve().unwrap_err();
        assert!(err.to_string().contains("[commonInterface.fields]"));
    }

    #[test]
    fn host_injected_plugins_key_is_dropped() {
        let raw: RawOptions = serde_json::from_value(serde_json::json!({
            "url": "http://cms.example.com",
            "plugins": [{ "resolve": "something" }],
        }))
        .unwrap();
        assert!(raw.resolve().is_ok());
    }
}
