// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    /// A namespace node carried a leaf flag outside the accepted encoding.
    #[error("unknown metrics format: node '{id}' has leaf flag {flag}")]
    MalformedMetadata { id: String, flag: String },

    #[error("unable to read URL {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unable to read URL {url}: server answered {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The caller asked for something the reader cannot express. Raised before any I/O.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("could not parse render payload: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// True for failures surfaced by the remote server or the network.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ReaderError::Transport { .. } | ReaderError::HttpStatus { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
