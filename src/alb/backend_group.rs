//! Backend group scenario.

use crate::defaults::{BackendSettings, Fixtures};
use crate::hcl::{Block, Document, Value};
use crate::names::NameGenerator;
use crate::verify::ExpectedBackends;

use super::{
    BACKEND_GROUP_ADDRESS, BACKEND_GROUP_TYPE, BaseInfra, SUBNET_ID, TARGET_GROUP_TYPE,
    instance_ip, labels,
};

const AUX_TARGET_GROUP_ID: &str = "yandex_alb_target_group.test-target-group.id";

/// Healthcheck kinds attached to every backend of the group.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HealthcheckKinds {
    /// HTTP healthcheck.
    pub http: bool,
    /// gRPC healthcheck.
    pub grpc: bool,
    /// Raw stream healthcheck.
    pub stream: bool,
}

/// A backend group with optional HTTP and gRPC backends.
///
/// The auxiliary `test-target-group` the backends point at is only declared
/// when at least one backend is present.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackendGroupScenario {
    name: String,
    description: String,
    target_group_name: String,
    http_backend: bool,
    grpc_backend: bool,
    healthchecks: HealthcheckKinds,
    data_source: bool,
    settings: BackendSettings,
    base: BaseInfra,
}

impl BackendGroupScenario {
    /// Creates a scenario without backends, healthchecks or data source.
    #[must_use]
    pub fn new(fixtures: &Fixtures, names: &mut impl NameGenerator) -> Self {
        let name = names.name_with_prefix(&fixtures.prefixes.backend_group);
        let target_group_name = names.name_with_prefix(&fixtures.prefixes.target_group);
        let base = BaseInfra::new(&fixtures.prefixes.instance, &fixtures.instance, names);
        Self {
            name,
            description: fixtures.backend_group_description.clone(),
            target_group_name,
            http_backend: false,
            grpc_backend: false,
            healthchecks: HealthcheckKinds::default(),
            data_source: false,
            settings: fixtures.backend.clone(),
            base,
        }
    }

    /// Toggles the HTTP backend.
    #[must_use]
    pub const fn with_http_backend(mut self, enabled: bool) -> Self {
        self.http_backend = enabled;
        self
    }

    /// Toggles the gRPC backend.
    #[must_use]
    pub const fn with_grpc_backend(mut self, enabled: bool) -> Self {
        self.grpc_backend = enabled;
        self
    }

    /// Selects the healthchecks attached to each backend.
    #[must_use]
    pub const fn with_healthchecks(mut self, kinds: HealthcheckKinds) -> Self {
        self.healthchecks = kinds;
        self
    }

    /// Also declares the `test-bg-ds` data source.
    #[must_use]
    pub const fn with_data_source(mut self, enabled: bool) -> Self {
        self.data_source = enabled;
        self
    }

    /// Generated backend group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixture settings the backends are rendered with.
    #[must_use]
    pub const fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Healthcheck kinds attached to every backend.
    #[must_use]
    pub const fn healthchecks(&self) -> HealthcheckKinds {
        self.healthchecks
    }

    /// Whether the data source is declared.
    #[must_use]
    pub const fn has_data_source(&self) -> bool {
        self.data_source
    }

    /// Backend families the materialized group must carry.
    #[must_use]
    pub const fn expected_backends(&self) -> ExpectedBackends {
        ExpectedBackends {
            http: self.http_backend,
            grpc: self.grpc_backend,
        }
    }

    fn healthcheck(&self, kind: Block) -> Block {
        Block::new("healthcheck")
            .attr("timeout", self.settings.timeout.to_string())
            .attr("interval", self.settings.interval.to_string())
            .block(kind)
    }

    fn backend(&self, kind: &str, name: &str) -> Block {
        let settings = &self.settings;
        let checks = self.healthchecks;
        Block::new(kind)
            .attr("name", name)
            .attr("weight", settings.weight)
            .attr("port", settings.port)
            .attr(
                "target_group_ids",
                Value::List(vec![Value::interpolation(AUX_TARGET_GROUP_ID)]),
            )
            .block(
                Block::new("tls").attr("sni", settings.tls_sni.as_str()).block(
                    Block::new("validation_context")
                        .attr("trusted_ca_bytes", settings.tls_validation_context.as_str()),
                ),
            )
            .block(
                Block::new("load_balancing_config")
                    .attr("panic_threshold", settings.panic_threshold)
                    .attr("locality_aware_routing_percent", settings.locality_percent)
                    .attr("strict_locality", settings.strict_locality),
            )
            .block_if(checks.grpc, || {
                self.healthcheck(
                    Block::new("grpc_healthcheck")
                        .attr("service_name", settings.service_name.as_str()),
                )
            })
            .block_if(checks.stream, || {
                self.healthcheck(
                    Block::new("stream_healthcheck")
                        .attr("receive", settings.receive.as_str())
                        .attr("send", settings.send.as_str()),
                )
            })
            .block_if(checks.http, || {
                self.healthcheck(
                    Block::new("http_healthcheck")
                        .attr("host", settings.host.as_str())
                        .attr("path", settings.path.as_str())
                        .attr("http2", settings.http2),
                )
            })
    }

    fn auxiliary_target_group(&self) -> Block {
        let targets = self.base.instance_resource_names().into_iter().map(|resource| {
            Block::new("target")
                .attr("subnet_id", Value::interpolation(SUBNET_ID))
                .attr("ip_address", Value::interpolation(instance_ip(&resource)))
        });
        Block::resource(TARGET_GROUP_TYPE, "test-target-group")
            .attr("name", self.target_group_name.as_str())
            .blocks(targets)
    }

    /// Builds the full document: data source, backend group, auxiliary
    /// target group and base.
    #[must_use]
    pub fn document(&self) -> Document {
        let group = Block::resource(BACKEND_GROUP_TYPE, "test-bg")
            .attr("name", self.name.as_str())
            .attr("description", self.description.as_str())
            .attr("labels", labels())
            .block_if(self.http_backend, || {
                self.backend("http_backend", "test-http-backend")
                    .attr("http2", self.settings.http2)
            })
            .block_if(self.grpc_backend, || {
                self.backend("grpc_backend", "test-grpc-backend")
            });

        Document::new()
            .with_if(self.data_source, || {
                Block::data(BACKEND_GROUP_TYPE, "test-bg-ds")
                    .attr("name", Value::reference(format!("{BACKEND_GROUP_ADDRESS}.name")))
            })
            .with(group)
            .with_if(self.http_backend || self.grpc_backend, || {
                self.auxiliary_target_group()
            })
            .merge(self.base.document())
    }
}
