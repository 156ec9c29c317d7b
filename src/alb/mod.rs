//! ALB acceptance scenarios expressed as structured documents.
//!
//! Each scenario owns the names it generated and knows which objects the
//! apply step will materialize, so the same value drives both rendering and
//! verification.

mod backend_group;
mod base;
mod target_group;
#[cfg(test)]
mod tests;

pub use backend_group::{BackendGroupScenario, HealthcheckKinds};
pub use base::BaseInfra;
pub use target_group::TargetGroupScenario;

use crate::hcl::Value;

/// Resource type of application target groups.
pub const TARGET_GROUP_TYPE: &str = "yandex_alb_target_group";
/// Resource type of application backend groups.
pub const BACKEND_GROUP_TYPE: &str = "yandex_alb_backend_group";

/// Address of the target group under test.
pub const TARGET_GROUP_ADDRESS: &str = "yandex_alb_target_group.test-tg";
/// Address of the target group data source.
pub const TARGET_GROUP_DATA_ADDRESS: &str = "data.yandex_alb_target_group.test-tg-ds";
/// Address of the backend group under test.
pub const BACKEND_GROUP_ADDRESS: &str = "yandex_alb_backend_group.test-bg";
/// Address of the backend group data source.
pub const BACKEND_GROUP_DATA_ADDRESS: &str = "data.yandex_alb_backend_group.test-bg-ds";

const SUBNET_ID: &str = "yandex_vpc_subnet.test-subnet.id";

fn labels() -> Value {
    Value::map([("tf-label", "tf-label-value"), ("empty-label", "")])
}

fn instance_ip(resource_name: &str) -> String {
    format!("yandex_compute_instance.{resource_name}.network_interface.0.ip_address")
}
