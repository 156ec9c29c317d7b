//! Command-line interface definitions for the `albharness` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `albharness` binary.
#[derive(Debug, Parser)]
#[command(
    name = "albharness",
    about = "Render and verify Application Load Balancer acceptance scenarios",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Render a structured scenario document.
    #[command(subcommand)]
    Render(RenderCommand),
    /// Render a text template against fixture values.
    #[command(name = "template")]
    Template(TemplateCommand),
    /// Verify applied state against a scenario's expectations.
    #[command(subcommand)]
    Verify(VerifyCommand),
}

/// Scenarios the `render` subcommand knows.
#[derive(Debug, Subcommand)]
pub(crate) enum RenderCommand {
    /// Target group with one target per instance.
    TargetGroup(RenderTargetGroup),
    /// Backend group with optional HTTP and gRPC backends.
    BackendGroup(RenderBackendGroup),
}

/// Name generation options shared by rendering commands.
#[derive(Debug, Args)]
pub(crate) struct NameOptions {
    /// Seed for reproducible resource names; random names are used otherwise.
    #[arg(long, value_name = "SEED")]
    pub(crate) seed: Option<u64>,
}

/// Arguments for `albharness render target-group`.
#[derive(Debug, Args)]
pub(crate) struct RenderTargetGroup {
    /// Number of instances and therefore targets.
    #[arg(long, default_value_t = 2)]
    pub(crate) targets: usize,
    /// Also declare the target group data source.
    #[arg(long)]
    pub(crate) data_source: bool,
    #[command(flatten)]
    pub(crate) names: NameOptions,
}

/// Arguments for `albharness render backend-group`.
#[derive(Debug, Args)]
pub(crate) struct RenderBackendGroup {
    /// Declare an HTTP backend.
    #[arg(long)]
    pub(crate) http: bool,
    /// Declare a gRPC backend.
    #[arg(long)]
    pub(crate) grpc: bool,
    /// Attach an HTTP healthcheck to each backend.
    #[arg(long)]
    pub(crate) http_check: bool,
    /// Attach a gRPC healthcheck to each backend.
    #[arg(long)]
    pub(crate) grpc_check: bool,
    /// Attach a stream healthcheck to each backend.
    #[arg(long)]
    pub(crate) stream_check: bool,
    /// Also declare the backend group data source.
    #[arg(long)]
    pub(crate) data_source: bool,
    #[command(flatten)]
    pub(crate) names: NameOptions,
}

/// Arguments for `albharness template`.
#[derive(Debug, Args)]
pub(crate) struct TemplateCommand {
    /// Template file to render.
    #[arg(value_name = "TEMPLATE")]
    pub(crate) template: String,
    /// JSON object of fixture values; overrides the defaults when both apply.
    #[arg(long, value_name = "PATH")]
    pub(crate) fixtures: Option<String>,
    /// Start from the configured fixture defaults.
    #[arg(long)]
    pub(crate) defaults: bool,
    #[command(flatten)]
    pub(crate) names: NameOptions,
}

/// Objects the `verify` subcommand can check.
#[derive(Debug, Subcommand)]
pub(crate) enum VerifyCommand {
    /// Check backend presence and settings of a backend group.
    BackendGroup(VerifyBackendGroup),
    /// Check target count and addresses of a target group.
    TargetGroup(VerifyTargetGroup),
}

/// Arguments for `albharness verify backend-group`.
#[derive(Debug, Args)]
pub(crate) struct VerifyBackendGroup {
    /// Applied state as JSON keyed by configuration address.
    #[arg(long, value_name = "PATH")]
    pub(crate) state: String,
    /// Address of the backend group within the state.
    #[arg(long, default_value = "yandex_alb_backend_group.test-bg")]
    pub(crate) address: String,
    /// Expect HTTP backends.
    #[arg(long)]
    pub(crate) http: bool,
    /// Expect gRPC backends.
    #[arg(long)]
    pub(crate) grpc: bool,
    /// Also compare backend settings and healthcheck kinds with the
    /// configured defaults.
    #[arg(long)]
    pub(crate) settings: bool,
    /// With `--settings`, expect an HTTP healthcheck on each backend.
    #[arg(long, requires = "settings")]
    pub(crate) http_check: bool,
    /// With `--settings`, expect a gRPC healthcheck on each backend.
    #[arg(long, requires = "settings")]
    pub(crate) grpc_check: bool,
    /// With `--settings`, expect a stream healthcheck on each backend.
    #[arg(long, requires = "settings")]
    pub(crate) stream_check: bool,
}

/// Arguments for `albharness verify target-group`.
#[derive(Debug, Args)]
pub(crate) struct VerifyTargetGroup {
    /// Applied state as JSON keyed by configuration address.
    #[arg(long, value_name = "PATH")]
    pub(crate) state: String,
    /// Address of the target group within the state.
    #[arg(long, default_value = "yandex_alb_target_group.test-tg")]
    pub(crate) address: String,
    /// Instance whose address a target must carry; repeat per instance.
    #[arg(long = "instance", value_name = "NAME", required = true)]
    pub(crate) instances: Vec<String>,
    /// Recorded instance addresses as JSON; `yc` is queried when absent.
    #[arg(long, value_name = "PATH")]
    pub(crate) addresses: Option<String>,
    /// Path to the `yc` CLI binary.
    #[arg(long, value_name = "PATH", default_value = "yc")]
    pub(crate) yc_bin: String,
    /// Folder to look instances up in.
    #[arg(long, value_name = "ID")]
    pub(crate) folder_id: Option<String>,
}
