//! Target group scenario.

use crate::defaults::Fixtures;
use crate::hcl::{Block, Document, Value};
use crate::names::NameGenerator;

use super::{BaseInfra, SUBNET_ID, TARGET_GROUP_ADDRESS, TARGET_GROUP_TYPE, instance_ip, labels};

/// A target group with one target per base instance, optionally read back
/// through a data source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetGroupScenario {
    name: String,
    description: String,
    data_source: bool,
    base: BaseInfra,
}

impl TargetGroupScenario {
    /// Creates a scenario with freshly generated group and instance names.
    #[must_use]
    pub fn new(fixtures: &Fixtures, names: &mut impl NameGenerator) -> Self {
        let name = names.name_with_prefix(&fixtures.prefixes.target_group);
        let base = BaseInfra::new(&fixtures.prefixes.instance, &fixtures.instance, names);
        Self {
            name,
            description: fixtures.target_group_description.clone(),
            data_source: false,
            base,
        }
    }

    /// Also declares the `test-tg-ds` data source.
    #[must_use]
    pub const fn with_data_source(mut self, enabled: bool) -> Self {
        self.data_source = enabled;
        self
    }

    /// Overrides the number of instances and therefore targets.
    #[must_use]
    pub fn with_targets(mut self, count: usize) -> Self {
        self.base = self.base.with_instance_count(count);
        self
    }

    /// Generated target group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the data source is declared.
    #[must_use]
    pub const fn has_data_source(&self) -> bool {
        self.data_source
    }

    /// Instance names whose addresses the targets must carry.
    #[must_use]
    pub fn expected_instance_names(&self) -> Vec<String> {
        self.base.instance_names()
    }

    /// Builds the full document: data source, target group and base.
    #[must_use]
    pub fn document(&self) -> Document {
        let targets = self.base.instance_resource_names().into_iter().map(|resource| {
            Block::new("target")
                .attr("subnet_id", Value::reference(SUBNET_ID))
                .attr("ip_address", Value::reference(instance_ip(&resource)))
        });
        Document::new()
            .with_if(self.data_source, || {
                Block::data(TARGET_GROUP_TYPE, "test-tg-ds")
                    .attr("name", Value::reference(format!("{TARGET_GROUP_ADDRESS}.name")))
            })
            .with(
                Block::resource(TARGET_GROUP_TYPE, "test-tg")
                    .attr("name", self.name.as_str())
                    .attr("description", self.description.as_str())
                    .attr("labels", labels())
                    .blocks(targets),
            )
            .merge(self.base.document())
    }
}
