//! Post-apply verification of materialized ALB objects.
//!
//! Every check is a single fail-fast pass: the first mismatch is returned and
//! nothing is retried. Callers invoke verification only after the apply step
//! reports convergence.

use std::fmt;

use thiserror::Error;

use crate::alb::HealthcheckKinds;
use crate::defaults::BackendSettings;
use crate::duration::HealthcheckDuration;
use crate::lookup::{AddressLookup, SubnetAddressMap};
use crate::model::{Backend, BackendGroup, HealthCheck, HealthCheckKind, TargetGroup};

/// Backend protocol families of a backend group.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackendKind {
    /// HTTP backends.
    Http,
    /// gRPC backends.
    Grpc,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Grpc => "grpc",
        })
    }
}

/// Which backend families a backend group is expected to carry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExpectedBackends {
    /// HTTP backends present.
    pub http: bool,
    /// gRPC backends present.
    pub grpc: bool,
}

impl ExpectedBackends {
    /// Expects only HTTP backends.
    #[must_use]
    pub const fn http_only() -> Self {
        Self {
            http: true,
            grpc: false,
        }
    }

    /// Expects only gRPC backends.
    #[must_use]
    pub const fn grpc_only() -> Self {
        Self {
            http: false,
            grpc: true,
        }
    }

    /// Expects no backends at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            http: false,
            grpc: false,
        }
    }
}

/// Actual object shape differs from the expectation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VerificationMismatch {
    /// A backend family is present when it should be absent, or vice versa.
    #[error("invalid presence or absence of {kind} backend in backend group {group}: expected {}", presence(*expected))]
    BackendPresence {
        /// Backend group name.
        group: String,
        /// Family that failed the check.
        kind: BackendKind,
        /// Whether the family was expected.
        expected: bool,
    },
    /// The target group has the wrong number of members.
    #[error("invalid count of targets in target group {group}: expected {expected}, got {actual}")]
    TargetCount {
        /// Target group name.
        group: String,
        /// Expected member count.
        expected: usize,
        /// Actual member count.
        actual: usize,
    },
    /// A target references a subnet absent from the address mapping.
    #[error("invalid subnet {subnet_id} of target {ip_address} in target group {group}")]
    UnknownSubnet {
        /// Target group name.
        group: String,
        /// Offending subnet.
        subnet_id: String,
        /// Address of the offending target.
        ip_address: String,
    },
    /// A target address is not valid for its subnet.
    #[error("invalid address {ip_address} of target in subnet {subnet_id} in target group {group}")]
    UnknownAddress {
        /// Target group name.
        group: String,
        /// Subnet of the offending target.
        subnet_id: String,
        /// Offending address.
        ip_address: String,
    },
    /// A healthcheck kind is present on a backend when it should be absent,
    /// or vice versa.
    #[error("invalid presence or absence of {kind} healthcheck on backend {backend} in backend group {group}: expected {}", presence(*expected))]
    HealthcheckPresence {
        /// Backend group name.
        group: String,
        /// Backend name.
        backend: String,
        /// Healthcheck kind that failed the check.
        kind: &'static str,
        /// Whether the kind was expected.
        expected: bool,
    },
    /// A backend field differs from the fixture setting.
    #[error("backend {backend} in backend group {group} has {field} {actual}, expected {expected}")]
    BackendSetting {
        /// Backend group name.
        group: String,
        /// Backend name.
        backend: String,
        /// Field that differs.
        field: &'static str,
        /// Expected value.
        expected: String,
        /// Actual value.
        actual: String,
    },
    /// A data source resolved to a different object than the resource.
    #[error("{kind} data source has {field} {data_source}, resource has {resource}")]
    NotSameObject {
        /// Object kind, e.g. `target group`.
        kind: &'static str,
        /// Field that differs.
        field: &'static str,
        /// Value on the resource.
        resource: String,
        /// Value on the data source.
        data_source: String,
    },
}

const fn presence(expected: bool) -> &'static str {
    if expected { "present" } else { "absent" }
}

/// Errors raised by verification steps that consult an address lookup.
#[derive(Debug, Error)]
pub enum VerifyError<E> {
    /// The object does not match.
    #[error(transparent)]
    Mismatch(#[from] VerificationMismatch),
    /// The lookup failed; the fixture itself is broken. The lookup error is
    /// reported as is.
    #[error(transparent)]
    Lookup(E),
}

/// Checks HTTP presence, then gRPC presence, against `expected`.
///
/// # Errors
///
/// Returns [`VerificationMismatch::BackendPresence`] naming the group and the
/// first family whose presence differs.
pub fn verify_backend_group(
    actual: &BackendGroup,
    expected: ExpectedBackends,
) -> Result<(), VerificationMismatch> {
    let families = [
        (BackendKind::Http, actual.http.is_some(), expected.http),
        (BackendKind::Grpc, actual.grpc.is_some(), expected.grpc),
    ];
    for (kind, present, wanted) in families {
        if present != wanted {
            return Err(VerificationMismatch::BackendPresence {
                group: actual.name.clone(),
                kind,
                expected: wanted,
            });
        }
    }
    tracing::debug!(group = %actual.name, "backend group presence verified");
    Ok(())
}

/// Resolves `expected_names` through `lookup`, then checks the target group
/// against the resulting mapping.
///
/// # Errors
///
/// Returns [`VerifyError::Lookup`] with the lookup error unchanged, or
/// [`VerifyError::Mismatch`] for the first failing target check.
pub fn verify_target_group<L: AddressLookup>(
    actual: &TargetGroup,
    expected_names: &[String],
    lookup: &L,
) -> Result<(), VerifyError<L::Error>> {
    let addresses = lookup
        .subnet_addresses(expected_names)
        .map_err(VerifyError::Lookup)?;
    verify_targets(actual, expected_names.len(), &addresses)?;
    Ok(())
}

/// Checks the member count, then each member's subnet and address.
///
/// # Errors
///
/// Returns the first [`VerificationMismatch`] found, in target order.
pub fn verify_targets(
    actual: &TargetGroup,
    expected_count: usize,
    addresses: &SubnetAddressMap,
) -> Result<(), VerificationMismatch> {
    if actual.targets.len() != expected_count {
        return Err(VerificationMismatch::TargetCount {
            group: actual.name.clone(),
            expected: expected_count,
            actual: actual.targets.len(),
        });
    }

    for target in &actual.targets {
        let Some(valid) = addresses.addresses(&target.subnet_id) else {
            return Err(VerificationMismatch::UnknownSubnet {
                group: actual.name.clone(),
                subnet_id: target.subnet_id.clone(),
                ip_address: target.ip_address.clone(),
            });
        };
        if !valid.contains(&target.ip_address) {
            return Err(VerificationMismatch::UnknownAddress {
                group: actual.name.clone(),
                subnet_id: target.subnet_id.clone(),
                ip_address: target.ip_address.clone(),
            });
        }
    }
    tracing::debug!(
        group = %actual.name,
        targets = actual.targets.len(),
        "target group verified"
    );
    Ok(())
}

/// Checks every backend's settings and healthchecks against the fixture
/// settings. HTTP/2 is only checked on HTTP backends.
///
/// # Errors
///
/// Returns [`VerificationMismatch::BackendSetting`] for the first field that
/// differs.
pub fn verify_backend_settings(
    actual: &BackendGroup,
    settings: &BackendSettings,
) -> Result<(), VerificationMismatch> {
    for (backend, kind) in backends(actual) {
        let check = SettingCheck {
            group: &actual.name,
            backend,
        };
        check.backend(settings, kind)?;
        for healthcheck in &backend.healthchecks {
            check.healthcheck(healthcheck, settings)?;
        }
    }
    tracing::debug!(group = %actual.name, "backend settings verified");
    Ok(())
}

/// Checks that every backend carries exactly the healthcheck kinds in
/// `expected`, checking HTTP, then gRPC, then stream.
///
/// # Errors
///
/// Returns [`VerificationMismatch::HealthcheckPresence`] for the first backend
/// and kind whose presence differs.
pub fn verify_healthcheck_kinds(
    actual: &BackendGroup,
    expected: HealthcheckKinds,
) -> Result<(), VerificationMismatch> {
    let kinds = [
        ("http", expected.http),
        ("grpc", expected.grpc),
        ("stream", expected.stream),
    ];
    for backend in backends(actual).map(|(backend, _)| backend) {
        for (kind, wanted) in kinds {
            let present = backend
                .healthchecks
                .iter()
                .any(|healthcheck| healthcheck.check.kind() == kind);
            if present != wanted {
                return Err(VerificationMismatch::HealthcheckPresence {
                    group: actual.name.clone(),
                    backend: backend.name.clone(),
                    kind,
                    expected: wanted,
                });
            }
        }
    }
    tracing::debug!(group = %actual.name, "healthcheck kinds verified");
    Ok(())
}

fn backends(group: &BackendGroup) -> impl Iterator<Item = (&Backend, BackendKind)> {
    let http = group.http.iter().flat_map(|set| set.backends.iter());
    let grpc = group.grpc.iter().flat_map(|set| set.backends.iter());
    http.map(|backend| (backend, BackendKind::Http))
        .chain(grpc.map(|backend| (backend, BackendKind::Grpc)))
}

struct SettingCheck<'a> {
    group: &'a str,
    backend: &'a Backend,
}

impl SettingCheck<'_> {
    fn field<T>(
        &self,
        field: &'static str,
        expected: T,
        actual: T,
    ) -> Result<(), VerificationMismatch>
    where
        T: PartialEq + ToString,
    {
        if expected == actual {
            return Ok(());
        }
        Err(VerificationMismatch::BackendSetting {
            group: self.group.to_owned(),
            backend: self.backend.name.clone(),
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }

    fn backend(
        &self,
        settings: &BackendSettings,
        kind: BackendKind,
    ) -> Result<(), VerificationMismatch> {
        let backend = self.backend;
        self.field("weight", settings.weight, backend.weight)?;
        self.field("port", settings.port, backend.port)?;

        let (sni, trusted_ca) = backend.tls.as_ref().map_or(("", ""), |tls| {
            (tls.sni.as_str(), tls.trusted_ca_bytes.as_str())
        });
        self.field("tls sni", settings.tls_sni.as_str(), sni)?;
        self.field(
            "tls trusted ca bytes",
            settings.tls_validation_context.as_str(),
            trusted_ca,
        )?;

        let config = backend.load_balancing_config.clone().unwrap_or_default();
        self.field("panic threshold", settings.panic_threshold, config.panic_threshold)?;
        self.field(
            "locality aware routing percent",
            settings.locality_percent,
            config.locality_aware_routing_percent,
        )?;
        self.field("strict locality", settings.strict_locality, config.strict_locality)?;

        if kind == BackendKind::Http {
            self.field("http2", settings.http2, backend.use_http2)?;
        }
        Ok(())
    }

    fn duration(
        &self,
        field: &'static str,
        expected: HealthcheckDuration,
        actual: &str,
    ) -> Result<(), VerificationMismatch> {
        match actual.parse::<HealthcheckDuration>() {
            Ok(parsed) => self.field(field, expected, parsed),
            Err(_) => self.field(field, expected.to_string(), actual.to_owned()),
        }
    }

    fn healthcheck(
        &self,
        healthcheck: &HealthCheck,
        settings: &BackendSettings,
    ) -> Result<(), VerificationMismatch> {
        self.duration("healthcheck timeout", settings.timeout, &healthcheck.timeout)?;
        self.duration("healthcheck interval", settings.interval, &healthcheck.interval)?;
        match &healthcheck.check {
            HealthCheckKind::HttpHealthcheck { host, path, http2 } => {
                self.field("healthcheck host", settings.host.as_str(), host.as_str())?;
                self.field("healthcheck path", settings.path.as_str(), path.as_str())?;
                self.field("healthcheck http2", settings.http2, *http2)
            }
            HealthCheckKind::GrpcHealthcheck { service_name } => self.field(
                "healthcheck service name",
                settings.service_name.as_str(),
                service_name.as_str(),
            ),
            HealthCheckKind::StreamHealthcheck { send, receive } => {
                self.field("healthcheck send", settings.send.as_str(), send.as_str())?;
                self.field("healthcheck receive", settings.receive.as_str(), receive.as_str())
            }
        }
    }
}

fn same_object(
    kind: &'static str,
    fields: [(&'static str, &str, &str); 2],
) -> Result<(), VerificationMismatch> {
    for (field, resource, data_source) in fields {
        if resource != data_source {
            return Err(VerificationMismatch::NotSameObject {
                kind,
                field,
                resource: resource.to_owned(),
                data_source: data_source.to_owned(),
            });
        }
    }
    Ok(())
}

/// Confirms a target group data source resolved to the resource.
///
/// # Errors
///
/// Returns [`VerificationMismatch::NotSameObject`] when the identifiers or
/// names differ.
pub fn verify_same_target_group(
    resource: &TargetGroup,
    data_source: &TargetGroup,
) -> Result<(), VerificationMismatch> {
    same_object(
        "target group",
        [
            ("id", resource.id.as_str(), data_source.id.as_str()),
            ("name", resource.name.as_str(), data_source.name.as_str()),
        ],
    )
}

/// Confirms a backend group data source resolved to the resource.
///
/// # Errors
///
/// Returns [`VerificationMismatch::NotSameObject`] when the identifiers or
/// names differ.
pub fn verify_same_backend_group(
    resource: &BackendGroup,
    data_source: &BackendGroup,
) -> Result<(), VerificationMismatch> {
    same_object(
        "backend group",
        [
            ("id", resource.id.as_str(), data_source.id.as_str()),
            ("name", resource.name.as_str(), data_source.name.as_str()),
        ],
    )
}
