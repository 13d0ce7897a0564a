// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Command line front end for the Graphite reader.
//!
//! # Usage
//!
//! ```bash
//! graphite-reader --url https://graphite.example.com walk servers
//! graphite-reader --url https://graphite.example.com list servers.web1
//! graphite-reader --config graphite.yaml read 'servers.*.cpu' --start -1h
//! graphite-reader --url http://localhost:8080 --insecure resolve servers web1 cpu
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use graphite_reader::{
    GraphiteDataReader, GraphiteMetricsApi, GraphiteMetricsReader, ReadOptions, ReadResult,
    ReaderConfig, RenderFormat, Resolved, Targets, TlsVerify,
};

#[derive(Parser, Debug)]
#[command(name = "graphite-reader")]
#[command(about = "Read series and explore the metric tree of a Graphite host")]
#[command(version)]
struct Args {
    /// Base URL of the Graphite host
    #[arg(long, env = "GRAPHITE_URL", global = true)]
    url: Option<String>,

    /// YAML configuration file; command line flags override its values
    #[arg(short, long, env = "GRAPHITE_READER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<f64>,

    /// Do not validate TLS certificates
    #[arg(long, global = true, conflicts_with = "ca_path")]
    insecure: bool,

    /// PEM file or directory of trusted CA certificates
    #[arg(long, global = true)]
    ca_path: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the metric tree depth-first from ROOT
    Walk {
        #[arg(default_value = "")]
        root: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// List the direct children of PATH
    List {
        #[arg(default_value = "")]
        path: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Follow child names one level at a time from BASE
    Resolve {
        base: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Render one or more targets as a table
    Read {
        #[arg(required = true)]
        targets: Vec<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Keep the raw metric names as column labels
        #[arg(long)]
        no_multiindex: bool,
        /// Keep every name segment in the labels
        #[arg(long)]
        keep_duplicates: bool,
        #[arg(long)]
        format: Option<RenderFormat>,
        /// Treat targets as LABEL=TARGET pairs and print one table per label
        #[arg(long)]
        grouped: bool,
    },
    /// Expand a query into the matching metric paths
    Expand {
        query: String,
        #[arg(long)]
        leaves_only: bool,
    },
    /// Print every metric path known to the server
    Index,
}

fn init_tracing(json: bool) {
    // RUST_LOG takes precedence, fallback to warn to keep stdout clean
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Merge the optional config file with command line overrides.
fn load_config(args: &Args) -> Result<ReaderConfig> {
    let mut config = match &args.config {
        Some(path) => ReaderConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => match &args.url {
            Some(url) => ReaderConfig::new(url.clone()),
            None => bail!("either --url or --config is required"),
        },
    };

    if let Some(url) = &args.url {
        config.url = url.clone();
    }
    if let Some(timeout) = args.timeout_secs {
        config.timeout_secs = timeout;
    }
    if args.insecure {
        config.tls_verify = TlsVerify::Disabled;
    } else if let Some(ca_path) = &args.ca_path {
        config.tls_verify = TlsVerify::CaPath(ca_path.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn parse_groups(targets: &[String]) -> Result<BTreeMap<String, String>> {
    targets
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((label, target)) => Ok((label.to_string(), target.to_string())),
            None => bail!("grouped targets must look like LABEL=TARGET, got '{pair}'"),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = load_config(&args)?;
    tracing::info!(url = %config.url, timeout_secs = config.timeout_secs, "Starting graphite-reader");

    match args.command {
        Command::Walk { root, start, end } => {
            let reader = GraphiteMetricsReader::new(&config)?;
            let mut walk = reader.walk(&root, start.as_deref(), end.as_deref());
            while let Some(frame) = walk.next_frame().await {
                let frame = frame.with_context(|| format!("Failed to walk {root:?}"))?;
                let mut internal: Vec<_> = frame.internal.into_iter().collect();
                let mut leaves: Vec<_> = frame.leaves.into_iter().collect();
                internal.sort();
                leaves.sort();

                let path = if frame.path.is_empty() { "<root>" } else { frame.path.as_str() };
                println!("{path}");
                for node in internal {
                    println!("  + {node}");
                }
                for leaf in leaves {
                    println!("  - {leaf}");
                }
            }
        }
        Command::List { path, start, end } => {
            let reader = GraphiteMetricsReader::new(&config)?;
            for child in reader.list(&path, start.as_deref(), end.as_deref()).await? {
                println!("{child}");
            }
        }
        Command::Resolve { base, names } => {
            let reader = GraphiteMetricsReader::new(&config)?;
            let mut node = reader.namespace(&base);
            for (i, name) in names.iter().enumerate() {
                let resolved = node.resolve(name).await?;
                match resolved {
                    Resolved::Internal(child) if i + 1 < names.len() => node = child,
                    Resolved::Internal(child) => {
                        println!("internal: {}", child.base_path());
                        for child_name in child.names().await? {
                            println!("  {child_name}");
                        }
                    }
                    Resolved::Leaf(path) if i + 1 == names.len() => println!("leaf: {path}"),
                    Resolved::Leaf(path) => bail!("{path} is a leaf and has no children"),
                    Resolved::NotFound => {
                        bail!("no child named {name:?} under {:?}", node.base_path())
                    }
                }
            }
        }
        Command::Read {
            targets,
            start,
            end,
            no_multiindex,
            keep_duplicates,
            format,
            grouped,
        } => {
            let mut config = config;
            if let Some(format) = format {
                config.format = format;
            }
            let reader = GraphiteDataReader::new(&config)?;
            let targets = if grouped {
                Targets::Grouped(parse_groups(&targets)?)
            } else if targets.len() == 1 {
                Targets::Single(targets.concat())
            } else {
                Targets::Many(targets)
            };
            let options = ReadOptions {
                start,
                end,
                create_multiindex: !no_multiindex,
                remove_duplicates: !keep_duplicates,
            };

            match reader.read(&targets, &options).await? {
                ReadResult::Frame(frame) => print!("{frame}"),
                ReadResult::Panel(panel) => {
                    for (label, frame) in panel {
                        println!("[{label}]");
                        print!("{frame}");
                    }
                }
            }
        }
        Command::Expand { query, leaves_only } => {
            let api = GraphiteMetricsApi::new(&config)?;
            for path in api.expand(&query, leaves_only).await? {
                println!("{path}");
            }
        }
        Command::Index => {
            let api = GraphiteMetricsApi::new(&config)?;
            for path in api.index().await? {
                println!("{path}");
            }
        }
    }

    Ok(())
}
