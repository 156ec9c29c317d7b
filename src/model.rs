//! Materialized ALB objects as returned by the provisioning step.
//!
//! These mirror the fields of the Application Load Balancer API that the
//! verifier inspects. They are only ever read; the external apply step or a
//! JSON state file produces them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Application backend group.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BackendGroup {
    /// Provider-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Group name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Resource labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// HTTP backends, absent when the group serves gRPC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<BackendSet>,
    /// gRPC backends, absent when the group serves HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<BackendSet>,
}

impl BackendGroup {
    /// Every backend of either kind, HTTP first.
    pub fn backends(&self) -> impl Iterator<Item = &Backend> {
        self.http
            .iter()
            .chain(self.grpc.iter())
            .flat_map(|set| set.backends.iter())
    }
}

/// Backends of one protocol kind.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BackendSet {
    /// Backends in declaration order.
    #[serde(default)]
    pub backends: Vec<Backend>,
}

/// A single HTTP or gRPC backend.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Backend {
    /// Backend name.
    pub name: String,
    /// Relative weight.
    #[serde(alias = "backend_weight")]
    pub weight: u32,
    /// Port on the targets.
    pub port: u16,
    /// Target group identifiers served by this backend.
    #[serde(default)]
    pub target_group_ids: Vec<String>,
    /// TLS settings towards the targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<BackendTls>,
    /// Load balancing settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_config: Option<LoadBalancingConfig>,
    /// Healthchecks in declaration order.
    #[serde(default)]
    pub healthchecks: Vec<HealthCheck>,
    /// Whether HTTP/2 is used; always false for gRPC backends.
    #[serde(default)]
    pub use_http2: bool,
}

/// TLS settings of a backend.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BackendTls {
    /// Server name indication.
    #[serde(default)]
    pub sni: String,
    /// Trusted CA bytes.
    #[serde(default)]
    pub trusted_ca_bytes: String,
}

/// Load balancing settings of a backend.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LoadBalancingConfig {
    /// Panic threshold percentage.
    #[serde(default)]
    pub panic_threshold: u32,
    /// Locality-aware routing percentage.
    #[serde(default)]
    pub locality_aware_routing_percent: u32,
    /// Strict locality flag.
    #[serde(default)]
    pub strict_locality: bool,
}

/// Healthcheck attached to a backend.
///
/// Exactly one kind-specific block is required; state whose healthcheck carries
/// no known block, or a malformed one, fails to deserialize.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HealthCheck {
    /// Check timeout, e.g. `300s`.
    pub timeout: String,
    /// Check interval.
    pub interval: String,
    /// Kind-specific settings.
    #[serde(flatten)]
    pub check: HealthCheckKind,
}

/// Kind-specific healthcheck settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheckKind {
    /// HTTP healthcheck.
    HttpHealthcheck {
        /// Host header.
        host: String,
        /// Requested path.
        path: String,
        /// HTTP/2 flag.
        #[serde(default)]
        http2: bool,
    },
    /// gRPC healthcheck.
    GrpcHealthcheck {
        /// Service name.
        service_name: String,
    },
    /// Raw stream healthcheck.
    StreamHealthcheck {
        /// Payload sent.
        send: String,
        /// Payload expected back.
        receive: String,
    },
}

impl HealthCheckKind {
    /// Short kind name: `http`, `grpc` or `stream`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HttpHealthcheck { .. } => "http",
            Self::GrpcHealthcheck { .. } => "grpc",
            Self::StreamHealthcheck { .. } => "stream",
        }
    }
}

/// Application target group.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TargetGroup {
    /// Provider-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Group name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Resource labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Members in declaration order.
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// One member of a target group.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Target {
    /// Subnet the address belongs to.
    pub subnet_id: String,
    /// IPv4 address of the member.
    pub ip_address: String,
}

impl Target {
    /// Creates a target descriptor.
    #[must_use]
    pub fn new(subnet_id: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            subnet_id: subnet_id.into(),
            ip_address: ip_address.into(),
        }
    }
}

/// One materialized resource.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedResource {
    /// A backend group resource or data source.
    BackendGroup(BackendGroup),
    /// A target group resource or data source.
    TargetGroup(TargetGroup),
}

/// Resources produced by an apply, keyed by configuration address
/// (`yandex_alb_target_group.test-tg`, `data.yandex_alb_backend_group.test-bg-ds`).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AppliedState(BTreeMap<String, AppliedResource>);

impl AppliedState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses state from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload does not match.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Adds a resource under `address`, replacing any previous entry.
    #[must_use]
    pub fn with(mut self, address: impl Into<String>, resource: AppliedResource) -> Self {
        self.0.insert(address.into(), resource);
        self
    }

    /// Looks up a backend group by address.
    #[must_use]
    pub fn backend_group(&self, address: &str) -> Option<&BackendGroup> {
        match self.0.get(address) {
            Some(AppliedResource::BackendGroup(group)) => Some(group),
            _ => None,
        }
    }

    /// Looks up a target group by address.
    #[must_use]
    pub fn target_group(&self, address: &str) -> Option<&TargetGroup> {
        match self.0.get(address) {
            Some(AppliedResource::TargetGroup(group)) => Some(group),
            _ => None,
        }
    }

    /// Configuration addresses present in the state.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_state_keyed_by_address() {
        let json = r#"{
            "yandex_alb_backend_group.test-bg": {
                "kind": "backend_group",
                "id": "bg-1",
                "name": "tf-bg-abc",
                "http": {
                    "backends": [{
                        "name": "test-http-backend",
                        "weight": 1,
                        "port": 3,
                        "tls": {"sni": "tf-test-tls"},
                        "healthchecks": [{
                            "timeout": "300s",
                            "interval": "560s",
                            "grpc_healthcheck": {"service_name": "svc"}
                        }]
                    }]
                }
            },
            "yandex_alb_target_group.test-tg": {
                "kind": "target_group",
                "name": "tf-tg-abc",
                "targets": [{"subnet_id": "e9b-1", "ip_address": "192.168.0.10"}]
            }
        }"#;
        let state = AppliedState::from_json(json).expect("state parses");

        let group = state
            .backend_group("yandex_alb_backend_group.test-bg")
            .expect("backend group present");
        assert!(group.grpc.is_none());
        let backend = group.backends().next().expect("one backend");
        assert_eq!(backend.weight, 1);
        assert_eq!(
            backend.healthchecks.first().map(|healthcheck| healthcheck.check.clone()),
            Some(HealthCheckKind::GrpcHealthcheck {
                service_name: String::from("svc")
            })
        );

        let target_group = state
            .target_group("yandex_alb_target_group.test-tg")
            .expect("target group present");
        assert_eq!(
            target_group.targets,
            vec![Target::new("e9b-1", "192.168.0.10")]
        );
        assert!(state.target_group("yandex_alb_backend_group.test-bg").is_none());
    }

    #[test]
    fn backends_iterates_http_before_grpc() {
        let group = BackendGroup {
            name: String::from("bg"),
            http: Some(BackendSet {
                backends: vec![Backend {
                    name: String::from("h"),
                    ..Backend::default()
                }],
            }),
            grpc: Some(BackendSet {
                backends: vec![Backend {
                    name: String::from("g"),
                    ..Backend::default()
                }],
            }),
            ..BackendGroup::default()
        };
        let names = group
            .backends()
            .map(|backend| backend.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["h", "g"]);
    }
}
