// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Reader configuration, loadable from a YAML file.
//!
//! ```yaml
//! url: https://graphite.example.com
//! start: -1h
//! tls_verify: /etc/ssl/certs/
//! timeout_secs: 10
//! format: json
//! leaf_flags: lenient
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ReaderError, Result};
use crate::metrics::node::LeafFlagEncoding;
use crate::render::parse::RenderFormat;

/// Default directory of trusted CA certificates.
pub const DEFAULT_CA_PATH: &str = "/etc/ssl/certs/";

pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Certificate validation for HTTPS endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TlsVerifySetting", into = "TlsVerifySetting")]
pub enum TlsVerify {
    /// Validate against the built-in root store
    Enabled,
    Disabled,
    /// Validate against a PEM file or a directory of PEM files
    CaPath(PathBuf),
}

impl Default for TlsVerify {
    fn default() -> Self {
        TlsVerify::CaPath(PathBuf::from(DEFAULT_CA_PATH))
    }
}

/// YAML shape of `tls_verify`: a boolean or a path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TlsVerifySetting {
    Flag(bool),
    Path(PathBuf),
}

impl From<TlsVerifySetting> for TlsVerify {
    fn from(setting: TlsVerifySetting) -> Self {
        match setting {
            TlsVerifySetting::Flag(true) => TlsVerify::Enabled,
            TlsVerifySetting::Flag(false) => TlsVerify::Disabled,
            TlsVerifySetting::Path(path) => TlsVerify::CaPath(path),
        }
    }
}

impl From<TlsVerify> for TlsVerifySetting {
    fn from(verify: TlsVerify) -> Self {
        match verify {
            TlsVerify::Enabled => TlsVerifySetting::Flag(true),
            TlsVerify::Disabled => TlsVerifySetting::Flag(false),
            TlsVerify::CaPath(path) => TlsVerifySetting::Path(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Base URL of the Graphite host
    pub url: String,

    /// Default `from` of render and find requests, any Graphite time format
    #[serde(default)]
    pub start: Option<String>,

    /// Default `until`, same formats as `start`
    #[serde(default)]
    pub end: Option<String>,

    #[serde(default)]
    pub tls_verify: TlsVerify,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    #[serde(default)]
    pub format: RenderFormat,

    #[serde(default)]
    pub leaf_flags: LeafFlagEncoding,
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl ReaderConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            start: None,
            end: None,
            tls_verify: TlsVerify::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            format: RenderFormat::default(),
            leaf_flags: LeafFlagEncoding::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: ReaderConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ReaderError::Config("no URL specified".to_string()));
        }
        self.timeout()?;
        Ok(())
    }

    /// Per-request timeout; non-positive or unrepresentable values are rejected.
    pub fn timeout(&self) -> Result<Duration> {
        let invalid = || {
            ReaderError::Config(format!(
                "timeout_secs must be a positive number of seconds, got {}",
                self.timeout_secs
            ))
        };
        if self.timeout_secs <= 0.0 {
            return Err(invalid());
        }
        Duration::try_from_secs_f64(self.timeout_secs).map_err(|_| invalid())
    }

    /// Base URL without trailing slashes, ready for endpoint suffixes.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
