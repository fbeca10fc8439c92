//! Purpose: Explicit client configuration, resolved from the environment once at startup.
//! Exports: `ClientConfig`, `parse_endpoint`, `credentials_from_lookup`, `ENV_*` names.
//! Role: Replaces ad hoc global lookups; the call path only sees injected values.
//! Invariants: Endpoints are absolute http/https URLs.
//! Invariants: Credentials count only when both user and token are non-empty.
use std::path::PathBuf;

use url::Url;

use crate::core::encode::MapEncodingPolicy;
use crate::core::envelope::Credentials;
use crate::core::error::{Error, ErrorKind};

pub const ENV_ENDPOINT: &str = "SOAPWIRE_ENDPOINT";
pub const ENV_USER: &str = "SOAPWIRE_USER";
pub const ENV_TOKEN: &str = "SOAPWIRE_TOKEN";
pub const ENV_MAP_METHODS: &str = "SOAPWIRE_MAP_METHODS";
pub const ENV_DEBUG_DIR: &str = "SOAPWIRE_DEBUG_DIR";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub credentials: Option<Credentials>,
    pub map_methods: MapEncodingPolicy,
    pub debug_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            credentials: None,
            map_methods: MapEncodingPolicy::new(),
            debug_dir: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_map_methods(mut self, map_methods: MapEncodingPolicy) -> Self {
        self.map_methods = map_methods;
        self
    }

    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(env_lookup)
    }

    /// Builds a config from `lookup(name)`; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = non_empty(&lookup, ENV_ENDPOINT).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("remote endpoint is not configured")
                .with_hint(format!("Set {ENV_ENDPOINT} or pass --endpoint."))
        })?;
        let mut config = Self::new(&endpoint)?;
        config.credentials = credentials_from_lookup(&lookup);
        config.map_methods = non_empty(&lookup, ENV_MAP_METHODS)
            .map(|raw| parse_method_list(&raw))
            .unwrap_or_default();
        config.debug_dir = non_empty(&lookup, ENV_DEBUG_DIR).map(PathBuf::from);
        Ok(config)
    }
}

pub fn credentials_from_lookup<F>(lookup: F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::new(
        non_empty(&lookup, ENV_USER)?,
        non_empty(&lookup, ENV_TOKEN)?,
    );
    Some(credentials)
}

pub fn credentials_from_env() -> Option<Credentials> {
    credentials_from_lookup(env_lookup)
}

pub fn parse_endpoint(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw.trim()).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid endpoint url")
            .with_source(err)
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(Error::new(ErrorKind::Usage).with_message("endpoint must use http or https scheme")),
    }
}

/// Splits a comma-separated method list, ignoring blanks.
pub fn parse_method_list(raw: &str) -> MapEncodingPolicy {
    raw.split(',')
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .collect()
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ClientConfig, ENV_DEBUG_DIR, ENV_ENDPOINT, ENV_MAP_METHODS, ENV_TOKEN, ENV_USER};
    use crate::core::error::ErrorKind;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn full_environment_resolves_every_field() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "https://mail.example.com/services/webservice"),
            (ENV_USER, "acct"),
            (ENV_TOKEN, "tok"),
            (ENV_MAP_METHODS, "sendMapped, ,importList"),
            (ENV_DEBUG_DIR, "/tmp/soap-debug"),
        ]))
        .expect("config");
        assert_eq!(
            config.endpoint.as_str(),
            "https://mail.example.com/services/webservice"
        );
        let credentials = config.credentials.expect("credentials");
        assert_eq!(credentials.user, "acct");
        assert!(config.map_methods.uses_map_encoding("sendMapped"));
        assert!(config.map_methods.uses_map_encoding("importList"));
        assert_eq!(config.map_methods.methods().count(), 2);
        assert_eq!(config.debug_dir, Some(PathBuf::from("/tmp/soap-debug")));
    }

    #[test]
    fn half_credentials_count_as_missing() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "http://localhost:8080/"),
            (ENV_USER, "acct"),
            (ENV_TOKEN, "  "),
        ]))
        .expect("config");
        assert!(config.credentials.is_none());
        assert!(config.map_methods.is_empty());
        assert!(config.debug_dir.is_none());
    }

    #[test]
    fn missing_endpoint_is_usage_error() {
        let err = ClientConfig::from_lookup(lookup(&[])).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().expect("hint").contains(ENV_ENDPOINT));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let err = ClientConfig::new("ftp://example.com/").expect_err("scheme");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = ClientConfig::new("not a url").expect_err("parse");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
