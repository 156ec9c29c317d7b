//! Unit tests for ALB scenario documents.

use super::*;
use crate::hcl::Document;
use crate::names::SeededNames;
use crate::defaults::AlbDefaults;
use crate::hcl::Value;
use crate::test_helpers::{EnvGuard, fixtures};
use crate::verify::ExpectedBackends;
use rstest::rstest;

fn backend_group(http: bool, grpc: bool) -> BackendGroupScenario {
    BackendGroupScenario::new(&fixtures(), &mut SeededNames::new(7))
        .with_http_backend(http)
        .with_grpc_backend(grpc)
}

fn group_block(document: &Document) -> &crate::hcl::Block {
    document
        .find(BACKEND_GROUP_ADDRESS)
        .expect("backend group declared")
}

#[rstest]
fn base_declares_instances_network_and_subnet() {
    let base = BaseInfra::new("tf-instance", &fixtures().instance, &mut SeededNames::new(1))
        .with_instance_count(3);
    let document = base.document();
    let addresses = document.addresses();
    for expected in [
        "data.yandex_compute_image.test-image",
        "yandex_compute_instance.test-instance-1",
        "yandex_compute_instance.test-instance-3",
        "yandex_vpc_network.test-network",
        "yandex_vpc_subnet.test-subnet",
    ] {
        assert!(addresses.contains(expected), "missing {expected}");
    }
    assert_eq!(document.validate(), Ok(()));

    let names = base.instance_names();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|name| name.starts_with("tf-instance-")));
    assert!(names.last().is_some_and(|name| name.ends_with("-3")));
}

#[rstest]
fn target_group_has_one_target_per_instance() {
    let scenario = TargetGroupScenario::new(&fixtures(), &mut SeededNames::new(3)).with_targets(4);
    let document = scenario.document();
    let group = document.find(TARGET_GROUP_ADDRESS).expect("target group declared");
    assert_eq!(group.nested("target").count(), 4);
    assert_eq!(scenario.expected_instance_names().len(), 4);
    assert!(scenario.name().starts_with("tf-tg-"));
    let rendered = document.render().expect("document renders");
    assert!(rendered.contains(
        "ip_address = yandex_compute_instance.test-instance-4.network_interface.0.ip_address"
    ));
}

#[rstest]
#[case(false)]
#[case(true)]
fn target_group_data_source_is_gated(#[case] enabled: bool) {
    let scenario =
        TargetGroupScenario::new(&fixtures(), &mut SeededNames::new(3)).with_data_source(enabled);
    let document = scenario.document();
    assert_eq!(document.find(TARGET_GROUP_DATA_ADDRESS).is_some(), enabled);
    assert_eq!(scenario.has_data_source(), enabled);
    assert!(document.render().is_ok());
}

#[rstest]
#[case::none(false, false)]
#[case::http(true, false)]
#[case::grpc(false, true)]
#[case::both(true, true)]
fn backend_blocks_follow_flags(#[case] http: bool, #[case] grpc: bool) {
    let scenario = backend_group(http, grpc);
    let document = scenario.document();
    let group = group_block(&document);
    assert_eq!(group.nested("http_backend").count(), usize::from(http));
    assert_eq!(group.nested("grpc_backend").count(), usize::from(grpc));
    assert_eq!(
        document
            .find("yandex_alb_target_group.test-target-group")
            .is_some(),
        http || grpc
    );
    assert_eq!(scenario.expected_backends(), ExpectedBackends { http, grpc });
    assert!(document.render().is_ok(), "no dangling references");
}

#[rstest]
fn disabled_backends_leave_no_target_group_reference() {
    let rendered = backend_group(false, false)
        .document()
        .render()
        .expect("document renders");
    assert!(!rendered.contains("test-target-group"));
    assert!(!rendered.contains("http_backend"));
}

#[rstest]
fn healthchecks_are_attached_per_kind() {
    let scenario = backend_group(true, false).with_healthchecks(HealthcheckKinds {
        http: true,
        grpc: false,
        stream: true,
    });
    let document = scenario.document();
    let backend = group_block(&document)
        .nested("http_backend")
        .next()
        .expect("http backend");
    let kinds = backend
        .nested("healthcheck")
        .flat_map(|check| check.body().iter())
        .filter_map(|item| match item {
            crate::hcl::BodyItem::Block(block) => Some(block.kind().to_owned()),
            crate::hcl::BodyItem::Attribute { .. } => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(kinds, ["stream_healthcheck", "http_healthcheck"]);

    let rendered = document.render().expect("document renders");
    assert!(rendered.contains("interval = \"560s\""), "{rendered}");
    assert!(rendered.contains("http2 = true"), "{rendered}");
}

#[rstest]
fn backend_group_renders_fixture_settings() {
    let rendered = backend_group(false, true)
        .with_data_source(true)
        .document()
        .render()
        .expect("document renders");
    for expected in [
        "data \"yandex_alb_backend_group\" \"test-bg-ds\"",
        "name = yandex_alb_backend_group.test-bg.name",
        "description = \"alb-bg-description\"",
        "sni = \"tf-test-tls\"",
        "trusted_ca_bytes = \"tf-test-validation-context\"",
        "panic_threshold                = 50",
        "locality_aware_routing_percent = 35",
        "strict_locality                = true",
        "target_group_ids = [\"${yandex_alb_target_group.test-target-group.id}\"]",
        "subnet_id  = \"${yandex_vpc_subnet.test-subnet.id}\"",
    ] {
        assert!(rendered.contains(expected), "missing {expected}:\n{rendered}");
    }
}

#[rstest]
fn same_seed_renders_identical_documents() {
    let first = backend_group(true, true).document().render();
    let second = backend_group(true, true).document().render();
    assert_eq!(first, second);

    let other = BackendGroupScenario::new(&fixtures(), &mut SeededNames::new(8))
        .with_http_backend(true)
        .document()
        .render();
    assert_ne!(first, other);
}

#[tokio::test]
async fn loaded_defaults_render_enabled_flags() {
    let _guard = EnvGuard::set_vars(&[]).await;
    let loaded = AlbDefaults::load_without_cli_args()
        .expect("defaults load")
        .fixtures()
        .expect("valid defaults");
    let document = BackendGroupScenario::new(&loaded, &mut SeededNames::new(5))
        .with_http_backend(true)
        .with_healthchecks(HealthcheckKinds {
            http: true,
            ..HealthcheckKinds::default()
        })
        .document();

    let backend = group_block(&document)
        .nested("http_backend")
        .next()
        .expect("http backend");
    assert_eq!(backend.attribute("http2"), Some(&Value::Bool(true)));
    let balancing = backend
        .nested("load_balancing_config")
        .next()
        .expect("load balancing config");
    assert_eq!(balancing.attribute("strict_locality"), Some(&Value::Bool(true)));
    let check = backend
        .nested("healthcheck")
        .flat_map(|healthcheck| healthcheck.nested("http_healthcheck"))
        .next()
        .expect("http healthcheck");
    assert_eq!(check.attribute("http2"), Some(&Value::Bool(true)));

    let instance = document
        .find("yandex_compute_instance.test-instance-1")
        .expect("instance declared");
    let policy = instance
        .nested("scheduling_policy")
        .next()
        .expect("scheduling policy");
    assert_eq!(policy.attribute("preemptible"), Some(&Value::Bool(true)));

    let rendered = document.render().expect("document renders");
    assert!(rendered.contains("preemptible = true"), "{rendered}");
}
