//! Network, subnet, image and compute instances shared by every scenario.

use crate::defaults::InstanceSettings;
use crate::hcl::{Block, Document, Value};
use crate::names::NameGenerator;

use super::SUBNET_ID;

/// Instances booted when a scenario does not ask for a specific count.
pub const DEFAULT_INSTANCE_COUNT: usize = 2;

/// Base infrastructure: one image data source, N preemptible instances, one
/// network and one subnet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaseInfra {
    instance_name_prefix: String,
    instance_count: usize,
    settings: InstanceSettings,
}

impl BaseInfra {
    /// Creates base infrastructure whose instances are named
    /// `<random name with prefix>-<i>`.
    #[must_use]
    pub fn new(
        prefix: &str,
        settings: &InstanceSettings,
        names: &mut impl NameGenerator,
    ) -> Self {
        Self {
            instance_name_prefix: names.name_with_prefix(prefix),
            instance_count: DEFAULT_INSTANCE_COUNT,
            settings: settings.clone(),
        }
    }

    /// Overrides the number of instances.
    #[must_use]
    pub const fn with_instance_count(mut self, count: usize) -> Self {
        self.instance_count = count;
        self
    }

    /// Number of instances.
    #[must_use]
    pub const fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Provider-side instance names, in order.
    #[must_use]
    pub fn instance_names(&self) -> Vec<String> {
        (1..=self.instance_count)
            .map(|index| format!("{}-{index}", self.instance_name_prefix))
            .collect()
    }

    /// Configuration-side instance resource names, in order.
    #[must_use]
    pub fn instance_resource_names(&self) -> Vec<String> {
        (1..=self.instance_count)
            .map(|index| format!("test-instance-{index}"))
            .collect()
    }

    fn instance(&self, resource_name: String, name: String) -> Block {
        let settings = &self.settings;
        Block::resource("yandex_compute_instance", resource_name)
            .attr("name", name)
            .attr("platform_id", settings.platform_id.as_str())
            .attr("zone", settings.zone.as_str())
            .block(
                Block::new("resources")
                    .attr("cores", settings.cores)
                    .attr("core_fraction", settings.core_fraction)
                    .attr("memory", settings.memory_gb),
            )
            .block(
                Block::new("boot_disk").block(
                    Block::new("initialize_params")
                        .attr("size", settings.disk_size_gb)
                        .attr(
                            "image_id",
                            Value::reference("data.yandex_compute_image.test-image.id"),
                        ),
                ),
            )
            .block(Block::new("network_interface").attr("subnet_id", Value::reference(SUBNET_ID)))
            .block(Block::new("scheduling_policy").attr("preemptible", settings.preemptible))
    }

    /// Builds the base document.
    #[must_use]
    pub fn document(&self) -> Document {
        let image = Block::data("yandex_compute_image", "test-image")
            .attr("family", self.settings.image_family.as_str());
        let instances = self
            .instance_resource_names()
            .into_iter()
            .zip(self.instance_names())
            .fold(Document::new().with(image), |document, (resource_name, name)| {
                document.with(self.instance(resource_name, name))
            });
        instances
            .with(Block::resource("yandex_vpc_network", "test-network"))
            .with(
                Block::resource("yandex_vpc_subnet", "test-subnet")
                    .attr("zone", self.settings.zone.as_str())
                    .attr(
                        "network_id",
                        Value::reference("yandex_vpc_network.test-network.id"),
                    )
                    .attr(
                        "v4_cidr_blocks",
                        Value::List(vec![Value::from(self.settings.subnet_cidr.as_str())]),
                    ),
            )
    }
}
