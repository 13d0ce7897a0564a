// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Shared HTTP client construction and request helpers.

use reqwest::{Certificate, Client};
use std::path::Path;
use std::time::Duration;

use crate::config::TlsVerify;
use crate::error::{ReaderError, Result};

/// Build the pooled client used for every request of one reader.
pub(crate) fn build_client(tls_verify: &TlsVerify, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout);
    match tls_verify {
        TlsVerify::Enabled => {}
        TlsVerify::Disabled => {
            tracing::warn!("TLS certificate validation is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        TlsVerify::CaPath(path) => {
            // the CA material is the whole trust store
            builder = builder.tls_built_in_root_certs(false);
            for cert in load_certificates(path)? {
                builder = builder.add_root_certificate(cert);
            }
        }
    }
    builder
        .build()
        .map_err(|e| ReaderError::Config(format!("failed to create HTTP client: {e}")))
}

/// Read trusted roots from a PEM bundle or from every PEM file of a directory.
///
/// Finding no certificate at all is an error.
fn load_certificates(path: &Path) -> Result<Vec<Certificate>> {
    let certs = if path.is_dir() {
        load_directory(path)?
    } else {
        let pem = std::fs::read(path).map_err(|e| {
            ReaderError::Config(format!("cannot read CA file {}: {e}", path.display()))
        })?;
        Certificate::from_pem_bundle(&pem).map_err(|e| {
            ReaderError::Config(format!("invalid CA file {}: {e}", path.display()))
        })?
    };

    if certs.is_empty() {
        return Err(ReaderError::Config(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), count = certs.len(), "Loaded CA certificates");
    Ok(certs)
}

fn load_directory(path: &Path) -> Result<Vec<Certificate>> {
    let entries = std::fs::read_dir(path).map_err(|e| {
        ReaderError::Config(format!("cannot read CA directory {}: {e}", path.display()))
    })?;
    let mut certs = Vec::new();
    for entry in entries {
        let file = entry?.path();
        if !file.is_file() {
            continue;
        }
        let Ok(pem) = std::fs::read(&file) else {
            continue;
        };
        match Certificate::from_pem_bundle(&pem) {
            Ok(found) => certs.extend(found),
            Err(e) => tracing::trace!(file = %file.display(), error = %e, "Skipping non-PEM file"),
        }
    }
    Ok(certs)
}

/// GET `url` and return the body of a successful answer.
pub(crate) async fn get_text(client: &Client, url: &str, params: &[(&str, &str)]) -> Result<String> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|source| ReaderError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReaderError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(|source| ReaderError::Transport {
        url: url.to_string(),
        source,
    })
}
