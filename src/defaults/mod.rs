//! Fixture defaults loaded via `ortho-config`.
//!
//! Acceptance scenarios share one immutable set of defaults (timeouts,
//! thresholds, identifiers) constructed once per suite. [`AlbDefaults`] is the
//! layered configuration record; [`AlbDefaults::fixtures`] validates it and
//! produces the typed [`Fixtures`] passed explicitly into each scenario.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::duration::HealthcheckDuration;
use crate::template::{FixtureMap, FixtureValue};

/// Layered defaults for ALB acceptance scenarios.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "ALB",
    discovery(
        app_name = "albharness",
        env_var = "ALB_CONFIG_PATH",
        config_file_name = "albharness.toml",
        dotfile_name = ".albharness.toml",
        project_file_name = "albharness.toml"
    )
)]
pub struct AlbDefaults {
    /// Prefix for generated target group names.
    #[ortho_config(default = "tf-tg".to_owned())]
    pub target_group_prefix: String,
    /// Prefix for generated backend group names.
    #[ortho_config(default = "tf-bg".to_owned())]
    pub backend_group_prefix: String,
    /// Prefix for generated compute instance names.
    #[ortho_config(default = "tf-instance".to_owned())]
    pub instance_prefix: String,
    /// Description attached to backend groups.
    #[ortho_config(default = "alb-bg-description".to_owned())]
    pub backend_group_description: String,
    /// Description attached to target groups.
    #[ortho_config(default = "alb-tg-description".to_owned())]
    pub target_group_description: String,
    /// TLS server name indication for backends.
    #[ortho_config(default = "tf-test-tls".to_owned())]
    pub tls_sni: String,
    /// Trusted CA bytes placed in the TLS validation context.
    #[ortho_config(default = "tf-test-validation-context".to_owned())]
    pub tls_validation_context: String,
    /// Backend weight.
    #[ortho_config(default = 1)]
    pub backend_weight: u32,
    /// Panic threshold percentage.
    #[ortho_config(default = 50)]
    pub panic_threshold: u32,
    /// Locality-aware routing percentage.
    #[ortho_config(default = 35)]
    pub locality_percent: u32,
    /// Whether routing is strictly local. Unset means `true`.
    pub strict_locality: Option<bool>,
    /// Healthcheck timeout.
    #[ortho_config(default = "300s".to_owned())]
    pub timeout: String,
    /// Healthcheck interval.
    #[ortho_config(default = "560s".to_owned())]
    pub interval: String,
    /// Service name checked by gRPC healthchecks.
    #[ortho_config(default = "tf-test-service".to_owned())]
    pub service_name: String,
    /// Whether HTTP/2 is used towards backends and HTTP healthchecks. Unset
    /// means `true`.
    pub http2: Option<bool>,
    /// Host header for HTTP healthchecks.
    #[ortho_config(default = "tf-test-host".to_owned())]
    pub host: String,
    /// Path requested by HTTP healthchecks.
    #[ortho_config(default = "tf-test-path".to_owned())]
    pub path: String,
    /// Backend port.
    #[ortho_config(default = 3)]
    pub port: u16,
    /// Payload sent by stream healthchecks.
    #[ortho_config(default = "tf-test-send".to_owned())]
    pub send: String,
    /// Payload expected back by stream healthchecks.
    #[ortho_config(default = "tf-test-receive".to_owned())]
    pub receive: String,
    /// Availability zone for instances and the subnet.
    #[ortho_config(default = "ru-central1-a".to_owned())]
    pub zone: String,
    /// IPv4 CIDR of the test subnet.
    #[ortho_config(default = "192.168.0.0/24".to_owned())]
    pub subnet_cidr: String,
    /// Image family booted by test instances.
    #[ortho_config(default = "ubuntu-1804-lts".to_owned())]
    pub image_family: String,
    /// Compute platform identifier.
    #[ortho_config(default = "standard-v2".to_owned())]
    pub platform_id: String,
    /// vCPU count per instance.
    #[ortho_config(default = 2)]
    pub cores: u32,
    /// Guaranteed vCPU share in percent.
    #[ortho_config(default = 20)]
    pub core_fraction: u32,
    /// Memory per instance in GB.
    #[ortho_config(default = 2)]
    pub memory_gb: u32,
    /// Boot disk size in GB.
    #[ortho_config(default = 4)]
    pub disk_size_gb: u32,
    /// Whether instances are preemptible. Unset means `true`.
    pub preemptible: Option<bool>,
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value outside its allowed range.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

/// Settings shared by HTTP and gRPC backends and their healthchecks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackendSettings {
    /// TLS server name indication.
    pub tls_sni: String,
    /// Trusted CA bytes.
    pub tls_validation_context: String,
    /// Backend weight.
    pub weight: u32,
    /// Backend port.
    pub port: u16,
    /// Panic threshold percentage, at most 100.
    pub panic_threshold: u32,
    /// Locality-aware routing percentage, at most 100.
    pub locality_percent: u32,
    /// Whether routing is strictly local.
    pub strict_locality: bool,
    /// Healthcheck timeout.
    pub timeout: HealthcheckDuration,
    /// Healthcheck interval.
    pub interval: HealthcheckDuration,
    /// gRPC healthcheck service name.
    pub service_name: String,
    /// Whether HTTP/2 is enabled.
    pub http2: bool,
    /// HTTP healthcheck host.
    pub host: String,
    /// HTTP healthcheck path.
    pub path: String,
    /// Stream healthcheck payload sent.
    pub send: String,
    /// Stream healthcheck payload expected.
    pub receive: String,
}

/// Shape of the compute instances backing target groups.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSettings {
    /// Availability zone.
    pub zone: String,
    /// Subnet CIDR block.
    pub subnet_cidr: String,
    /// Boot image family.
    pub image_family: String,
    /// Platform identifier.
    pub platform_id: String,
    /// vCPU count.
    pub cores: u32,
    /// vCPU share in percent.
    pub core_fraction: u32,
    /// Memory in GB.
    pub memory_gb: u32,
    /// Disk size in GB.
    pub disk_size_gb: u32,
    /// Preemptible scheduling.
    pub preemptible: bool,
}

/// Name prefixes for generated resource names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamePrefixes {
    /// Target group prefix.
    pub target_group: String,
    /// Backend group prefix.
    pub backend_group: String,
    /// Compute instance prefix.
    pub instance: String,
}

/// Validated, typed fixture defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fixtures {
    /// Backend and healthcheck settings.
    pub backend: BackendSettings,
    /// Instance settings.
    pub instance: InstanceSettings,
    /// Name prefixes.
    pub prefixes: NamePrefixes,
    /// Backend group description.
    pub backend_group_description: String,
    /// Target group description.
    pub target_group_description: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn hint(&self) -> String {
        format!(
            "set {} or add {} to albharness.toml",
            self.env_var, self.toml_key
        )
    }
}

impl AlbDefaults {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    fn require_percentage(value: u32, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value > 100 {
            return Err(ConfigError::InvalidValue(format!(
                "{} must be between 0 and 100, got {value}: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    fn parse_duration(
        value: &str,
        metadata: &FieldMetadata,
    ) -> Result<HealthcheckDuration, ConfigError> {
        value.parse().map_err(|err| {
            ConfigError::InvalidValue(format!(
                "{} is not a valid duration ({err}): {}",
                metadata.description,
                metadata.hint()
            ))
        })
    }

    /// Loads defaults from configuration files and environment variables
    /// without parsing process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("albharness")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks every field without building the typed record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fixtures().map(|_| ())
    }

    /// Validates the record and converts it into typed [`Fixtures`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for blank strings and
    /// [`ConfigError::InvalidValue`] for out-of-range numbers or malformed
    /// durations.
    pub fn fixtures(&self) -> Result<Fixtures, ConfigError> {
        let required = [
            (
                &self.target_group_prefix,
                FieldMetadata::new("target group name prefix", "ALB_TARGET_GROUP_PREFIX", "target_group_prefix"),
            ),
            (
                &self.backend_group_prefix,
                FieldMetadata::new("backend group name prefix", "ALB_BACKEND_GROUP_PREFIX", "backend_group_prefix"),
            ),
            (
                &self.instance_prefix,
                FieldMetadata::new("instance name prefix", "ALB_INSTANCE_PREFIX", "instance_prefix"),
            ),
            (
                &self.tls_sni,
                FieldMetadata::new("TLS SNI", "ALB_TLS_SNI", "tls_sni"),
            ),
            (
                &self.tls_validation_context,
                FieldMetadata::new("TLS validation context", "ALB_TLS_VALIDATION_CONTEXT", "tls_validation_context"),
            ),
            (
                &self.service_name,
                FieldMetadata::new("gRPC healthcheck service name", "ALB_SERVICE_NAME", "service_name"),
            ),
            (
                &self.host,
                FieldMetadata::new("HTTP healthcheck host", "ALB_HOST", "host"),
            ),
            (
                &self.path,
                FieldMetadata::new("HTTP healthcheck path", "ALB_PATH", "path"),
            ),
            (
                &self.zone,
                FieldMetadata::new("availability zone", "ALB_ZONE", "zone"),
            ),
            (
                &self.subnet_cidr,
                FieldMetadata::new("subnet CIDR", "ALB_SUBNET_CIDR", "subnet_cidr"),
            ),
            (
                &self.image_family,
                FieldMetadata::new("image family", "ALB_IMAGE_FAMILY", "image_family"),
            ),
            (
                &self.platform_id,
                FieldMetadata::new("platform ID", "ALB_PLATFORM_ID", "platform_id"),
            ),
        ];
        for (value, metadata) in &required {
            Self::require_field(value, metadata)?;
        }

        Self::require_percentage(
            self.panic_threshold,
            &FieldMetadata::new("panic threshold", "ALB_PANIC_THRESHOLD", "panic_threshold"),
        )?;
        Self::require_percentage(
            self.locality_percent,
            &FieldMetadata::new(
                "locality-aware routing percent",
                "ALB_LOCALITY_PERCENT",
                "locality_percent",
            ),
        )?;
        Self::require_percentage(
            self.core_fraction,
            &FieldMetadata::new("core fraction", "ALB_CORE_FRACTION", "core_fraction"),
        )?;
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "backend port must be greater than zero: {}",
                FieldMetadata::new("backend port", "ALB_PORT", "port").hint()
            )));
        }

        let timeout = Self::parse_duration(
            &self.timeout,
            &FieldMetadata::new("healthcheck timeout", "ALB_TIMEOUT", "timeout"),
        )?;
        let interval = Self::parse_duration(
            &self.interval,
            &FieldMetadata::new("healthcheck interval", "ALB_INTERVAL", "interval"),
        )?;

        Ok(Fixtures {
            backend: BackendSettings {
                tls_sni: self.tls_sni.clone(),
                tls_validation_context: self.tls_validation_context.clone(),
                weight: self.backend_weight,
                port: self.port,
                panic_threshold: self.panic_threshold,
                locality_percent: self.locality_percent,
                strict_locality: self.strict_locality.unwrap_or(true),
                timeout,
                interval,
                service_name: self.service_name.clone(),
                http2: self.http2.unwrap_or(true),
                host: self.host.clone(),
                path: self.path.clone(),
                send: self.send.clone(),
                receive: self.receive.clone(),
            },
            instance: InstanceSettings {
                zone: self.zone.clone(),
                subnet_cidr: self.subnet_cidr.clone(),
                image_family: self.image_family.clone(),
                platform_id: self.platform_id.clone(),
                cores: self.cores,
                core_fraction: self.core_fraction,
                memory_gb: self.memory_gb,
                disk_size_gb: self.disk_size_gb,
                preemptible: self.preemptible.unwrap_or(true),
            },
            prefixes: NamePrefixes {
                target_group: self.target_group_prefix.clone(),
                backend_group: self.backend_group_prefix.clone(),
                instance: self.instance_prefix.clone(),
            },
            backend_group_description: self.backend_group_description.clone(),
            target_group_description: self.target_group_description.clone(),
        })
    }
}

impl Fixtures {
    /// Exposes the defaults under the key names used by string templates.
    /// Group names are random-with-prefix placeholders.
    #[must_use]
    pub fn fixture_map(&self) -> FixtureMap {
        let backend = &self.backend;
        FixtureMap::new()
            .with(
                "TGName",
                FixtureValue::random_with_prefix(self.prefixes.target_group.as_str()),
            )
            .with(
                "BGName",
                FixtureValue::random_with_prefix(self.prefixes.backend_group.as_str()),
            )
            .with("TGDescription", self.target_group_description.as_str())
            .with("BGDescription", self.backend_group_description.as_str())
            .with("TlsSni", backend.tls_sni.as_str())
            .with("TlsValidationContext", backend.tls_validation_context.as_str())
            .with("BackendWeight", backend.weight)
            .with("PanicThreshold", backend.panic_threshold)
            .with("LocalityPercent", backend.locality_percent)
            .with("StrictLocality", backend.strict_locality)
            .with("Timeout", backend.timeout.to_string())
            .with("Interval", backend.interval.to_string())
            .with("ServiceName", backend.service_name.as_str())
            .with("Http2", backend.http2)
            .with("Host", backend.host.as_str())
            .with("Path", backend.path.as_str())
            .with("Port", backend.port)
            .with("Send", backend.send.as_str())
            .with("Receive", backend.receive.as_str())
    }
}
