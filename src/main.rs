//! Binary entry point for the albharness CLI.

use std::io::{self, Write};
use std::process;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use albharness::{
    AddressLookup, AlbDefaults, AppliedState, BackendGroupScenario, ConfigError, DocumentError,
    ExpectedBackends, FixtureMap, HealthcheckKinds, LookupError, NameGenerator,
    ProcessCommandRunner, RandomNames, RenderError, SeededNames, StaticAddressLookup,
    TargetGroupScenario, Template, VerificationMismatch, VerifyError, YcAddressLookup,
};
use albharness::verify::{
    verify_backend_group, verify_backend_settings, verify_healthcheck_kinds, verify_target_group,
};

mod cli;

use cli::{
    Cli, NameOptions, RenderBackendGroup, RenderCommand, RenderTargetGroup, TemplateCommand,
    VerifyBackendGroup, VerifyCommand, VerifyTargetGroup,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("template error: {0}")]
    Template(#[from] RenderError),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("{path} has no {kind} at {address}")]
    MissingResource {
        path: String,
        kind: &'static str,
        address: String,
    },
    #[error("verification failed: {0}")]
    Verify(#[from] VerificationMismatch),
    #[error("address lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl From<VerifyError<LookupError>> for CliError {
    fn from(value: VerifyError<LookupError>) -> Self {
        match value {
            VerifyError::Mismatch(mismatch) => Self::Verify(mismatch),
            VerifyError::Lookup(err) => Self::Lookup(err),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(output) => {
            write_output(io::stdout(), &output);
            0
        }
        Err(err) => {
            write_error(io::stderr(), &err);
            1
        }
    };
    process::exit(exit_code);
}

fn dispatch(cli: Cli) -> Result<String, CliError> {
    match cli {
        Cli::Render(RenderCommand::TargetGroup(args)) => render_target_group(&args),
        Cli::Render(RenderCommand::BackendGroup(args)) => render_backend_group(&args),
        Cli::Template(args) => render_template(&args),
        Cli::Verify(VerifyCommand::BackendGroup(args)) => verify_backend(&args),
        Cli::Verify(VerifyCommand::TargetGroup(args)) => verify_targets(&args),
    }
}

fn names(options: &NameOptions) -> Box<dyn NameGenerator> {
    options.seed.map_or_else(
        || Box::new(RandomNames) as Box<dyn NameGenerator>,
        |seed| Box::new(SeededNames::new(seed)),
    )
}

fn render_target_group(args: &RenderTargetGroup) -> Result<String, CliError> {
    let fixtures = AlbDefaults::load_without_cli_args()?.fixtures()?;
    let mut generator = names(&args.names);
    let scenario = TargetGroupScenario::new(&fixtures, &mut generator)
        .with_targets(args.targets)
        .with_data_source(args.data_source);
    Ok(scenario.document().render()?)
}

fn render_backend_group(args: &RenderBackendGroup) -> Result<String, CliError> {
    let fixtures = AlbDefaults::load_without_cli_args()?.fixtures()?;
    let mut generator = names(&args.names);
    let scenario = BackendGroupScenario::new(&fixtures, &mut generator)
        .with_http_backend(args.http)
        .with_grpc_backend(args.grpc)
        .with_healthchecks(HealthcheckKinds {
            http: args.http_check,
            grpc: args.grpc_check,
            stream: args.stream_check,
        })
        .with_data_source(args.data_source);
    Ok(scenario.document().render()?)
}

fn render_template(args: &TemplateCommand) -> Result<String, CliError> {
    let source = read_to_string_ambient(&args.template)?;
    let template = Template::parse(&source)?;

    let mut fixtures = if args.defaults {
        AlbDefaults::load_without_cli_args()?.fixtures()?.fixture_map()
    } else {
        FixtureMap::new()
    };
    if let Some(path) = &args.fixtures {
        let overrides: FixtureMap = parse_json(path)?;
        fixtures = fixtures.merged(overrides);
    }

    let mut generator = names(&args.names);
    Ok(template.render_with(&fixtures, &mut generator)?)
}

fn load_state(path: &str) -> Result<AppliedState, CliError> {
    parse_json(path)
}

fn verify_backend(args: &VerifyBackendGroup) -> Result<String, CliError> {
    let state = load_state(&args.state)?;
    let group = state
        .backend_group(&args.address)
        .ok_or_else(|| CliError::MissingResource {
            path: args.state.clone(),
            kind: "backend group",
            address: args.address.clone(),
        })?;
    verify_backend_group(group, ExpectedBackends {
        http: args.http,
        grpc: args.grpc,
    })?;
    if args.settings {
        let fixtures = AlbDefaults::load_without_cli_args()?.fixtures()?;
        verify_backend_settings(group, &fixtures.backend)?;
        verify_healthcheck_kinds(group, HealthcheckKinds {
            http: args.http_check,
            grpc: args.grpc_check,
            stream: args.stream_check,
        })?;
    }
    Ok(format!("backend group {} verified\n", group.name))
}

fn verify_targets(args: &VerifyTargetGroup) -> Result<String, CliError> {
    let state = load_state(&args.state)?;
    let group = state
        .target_group(&args.address)
        .ok_or_else(|| CliError::MissingResource {
            path: args.state.clone(),
            kind: "target group",
            address: args.address.clone(),
        })?;

    if let Some(path) = &args.addresses {
        let lookup: StaticAddressLookup = parse_json(path)?;
        check_targets(group, &args.instances, &lookup)?;
    } else {
        let mut lookup = YcAddressLookup::new(args.yc_bin.as_str(), ProcessCommandRunner);
        if let Some(folder_id) = &args.folder_id {
            lookup = lookup.with_folder_id(folder_id.as_str());
        }
        check_targets(group, &args.instances, &lookup)?;
    }
    Ok(format!("target group {} verified\n", group.name))
}

fn check_targets<L>(
    group: &albharness::TargetGroup,
    instances: &[String],
    lookup: &L,
) -> Result<(), CliError>
where
    L: AddressLookup<Error = LookupError>,
{
    verify_target_group(group, instances, lookup)?;
    Ok(())
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, CliError> {
    let text = read_to_string_ambient(path)?;
    serde_json::from_str(&text).map_err(|err| CliError::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

fn read_to_string_ambient(path: &str) -> Result<String, CliError> {
    let io_error = |message: String| CliError::Io {
        path: path.to_owned(),
        message,
    };
    let path_buf = Utf8Path::new(path);
    let (dir_path, file_path) = match (path_buf.parent(), path_buf.file_name()) {
        (Some(parent), Some(file_name)) if !parent.as_str().is_empty() => {
            (parent, Utf8Path::new(file_name))
        }
        _ => (Utf8Path::new("."), path_buf),
    };

    let dir = Dir::open_ambient_dir(dir_path, ambient_authority())
        .map_err(|err| io_error(err.to_string()))?;
    dir.read_to_string(file_path)
        .map_err(|err| io_error(err.to_string()))
}

fn write_output(mut target: impl Write, output: &str) {
    target.write_all(output.as_bytes()).ok();
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
