//! Behavioural coverage for verifying applied backend and target groups.

use std::cell::RefCell;

use albharness::model::{BackendSet, Target};
use albharness::test_support::ScriptedRunner;
use albharness::verify::{verify_backend_group, verify_target_group};
use albharness::{
    BackendGroup, ExpectedBackends, StaticAddressLookup, TargetGroup, YcAddressLookup,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const DEFAULT_SUBNET: &str = "subnet-a";

/// Shared scenario state. Steps fill the slots in place.
#[derive(Debug)]
struct VerifyContext {
    backend_group: RefCell<BackendGroup>,
    target_group: RefCell<TargetGroup>,
    instances: RefCell<Vec<String>>,
    lookup: RefCell<StaticAddressLookup>,
    runner: ScriptedRunner,
    subnet: RefCell<String>,
    outcome: RefCell<Option<Result<(), String>>>,
}

impl VerifyContext {
    fn record(&self, outcome: Result<(), String>) {
        self.outcome.replace(Some(outcome));
    }

    fn set_targets(&self, targets: Vec<Target>) {
        self.target_group.replace(TargetGroup {
            id: String::from("tg-1"),
            name: String::from("tf-tg-behaviour"),
            targets,
            ..TargetGroup::default()
        });
    }

    fn matching_targets(&self, count: u32) -> Vec<Target> {
        let subnet = self.subnet.borrow();
        (0..count as usize)
            .map(|index| Target::new(subnet.as_str(), instance_address(index)))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[fixture]
fn verify_context() -> VerifyContext {
    VerifyContext {
        backend_group: RefCell::new(BackendGroup::default()),
        target_group: RefCell::new(TargetGroup::default()),
        instances: RefCell::new(Vec::new()),
        lookup: RefCell::new(StaticAddressLookup::new()),
        runner: ScriptedRunner::new(),
        subnet: RefCell::new(String::from(DEFAULT_SUBNET)),
        outcome: RefCell::new(None),
    }
}

fn instance_address(index: usize) -> String {
    format!("192.168.0.{}", index + 10)
}

fn backend_group(http: bool, grpc: bool) -> BackendGroup {
    BackendGroup {
        id: String::from("bg-1"),
        name: String::from("tf-bg-behaviour"),
        http: http.then(BackendSet::default),
        grpc: grpc.then(BackendSet::default),
        ..BackendGroup::default()
    }
}

#[given("a backend group with an HTTP backend only")]
fn http_only_group(verify_context: &VerifyContext) {
    verify_context.backend_group.replace(backend_group(true, false));
}

#[given("a backend group with HTTP and gRPC backends")]
fn http_and_grpc_group(verify_context: &VerifyContext) {
    verify_context.backend_group.replace(backend_group(true, true));
}

#[given("instances \"{first}\" and \"{second}\" on subnet \"{subnet}\"")]
fn recorded_instances(
    verify_context: &VerifyContext,
    first: String,
    second: String,
    subnet: String,
) {
    let instances = vec![first, second];
    let lookup = instances
        .iter()
        .enumerate()
        .fold(StaticAddressLookup::new(), |lookup, (index, name)| {
            lookup.with(name.as_str(), subnet.as_str(), instance_address(index))
        });
    verify_context.instances.replace(instances);
    verify_context.lookup.replace(lookup);
    verify_context.subnet.replace(subnet);
}

#[given("yc reports instances \"{first}\" and \"{second}\" on subnet \"{subnet}\"")]
fn yc_instances(
    verify_context: &VerifyContext,
    first: String,
    second: String,
    subnet: String,
) {
    for index in 0..2 {
        verify_context
            .runner
            .push_instance(&[(subnet.as_str(), instance_address(index).as_str())]);
    }
    verify_context.instances.replace(vec![first, second]);
    verify_context.subnet.replace(subnet);
}

#[given("no recorded instances")]
fn no_recorded_instances(verify_context: &VerifyContext) {
    verify_context.instances.replace(vec![String::from("vm-1")]);
    verify_context.lookup.replace(StaticAddressLookup::new());
}

#[given("a target group with {count:u32} matching target")]
fn one_matching_target(verify_context: &VerifyContext, count: u32) {
    verify_context.set_targets(verify_context.matching_targets(count));
}

#[given("a target group with {count:u32} matching targets")]
fn many_matching_targets(verify_context: &VerifyContext, count: u32) {
    verify_context.set_targets(verify_context.matching_targets(count));
}

#[given("a target group with a stray target \"{address}\"")]
fn stray_target(verify_context: &VerifyContext, address: String) {
    let mut targets = verify_context.matching_targets(1);
    targets.push(Target::new(verify_context.subnet.borrow().as_str(), address));
    verify_context.set_targets(targets);
}

#[when("I verify the backend group expecting HTTP \"{http}\" and gRPC \"{grpc}\"")]
fn verify_backends(verify_context: &VerifyContext, http: bool, grpc: bool) {
    let expected = ExpectedBackends { http, grpc };
    let outcome = verify_backend_group(&verify_context.backend_group.borrow(), expected)
        .map_err(|err| err.to_string());
    verify_context.record(outcome);
}

#[when("I verify the target group")]
fn verify_targets(verify_context: &VerifyContext) {
    let outcome = verify_target_group(
        &verify_context.target_group.borrow(),
        &verify_context.instances.borrow(),
        &*verify_context.lookup.borrow(),
    )
    .map_err(|err| err.to_string());
    verify_context.record(outcome);
}

#[when("I verify the target group through yc")]
fn verify_targets_through_yc(verify_context: &VerifyContext) {
    let lookup = YcAddressLookup::new("yc", verify_context.runner.clone());
    let outcome = verify_target_group(
        &verify_context.target_group.borrow(),
        &verify_context.instances.borrow(),
        &lookup,
    )
    .map_err(|err| err.to_string());
    verify_context.record(outcome);
}

#[then("verification passes")]
fn verification_passes(verify_context: &VerifyContext) -> Result<(), StepError> {
    match verify_context.outcome.borrow().as_ref() {
        Some(Ok(())) => Ok(()),
        Some(Err(message)) => Err(StepError::Assertion(format!(
            "expected success, got: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("verification did not run"))),
    }
}

#[then("verification fails with \"{fragment}\"")]
fn verification_fails(verify_context: &VerifyContext, fragment: String) -> Result<(), StepError> {
    match verify_context.outcome.borrow().as_ref() {
        Some(Err(message)) if message.contains(&fragment) => Ok(()),
        Some(Err(message)) => Err(StepError::Assertion(format!(
            "expected failure mentioning {fragment:?}, got: {message}"
        ))),
        Some(Ok(())) => Err(StepError::Assertion(String::from(
            "expected verification to fail",
        ))),
        None => Err(StepError::Assertion(String::from("verification did not run"))),
    }
}

#[then("yc was asked for instance \"{name}\"")]
fn yc_was_asked(verify_context: &VerifyContext, name: String) -> Result<(), StepError> {
    let expected = format!("yc compute instance get --name {name} --format json");
    let commands = verify_context
        .runner
        .invocations()
        .iter()
        .map(|call| call.command_string())
        .collect::<Vec<_>>();
    if commands.contains(&expected) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected:?} among {commands:?}"
        )))
    }
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Accept a backend group that matches the expected presence"
)]
fn scenario_backend_presence_matches(verify_context: VerifyContext) {
    drop(verify_context);
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Flag an unexpected gRPC backend"
)]
fn scenario_unexpected_grpc(verify_context: VerifyContext) {
    drop(verify_context);
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Flag a target count mismatch"
)]
fn scenario_target_count(verify_context: VerifyContext) {
    drop(verify_context);
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Flag a target whose address is not recorded"
)]
fn scenario_unknown_address(verify_context: VerifyContext) {
    drop(verify_context);
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Accept a target group that matches the recorded addresses"
)]
fn scenario_targets_match(verify_context: VerifyContext) {
    drop(verify_context);
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Surface address lookup failures unchanged"
)]
fn scenario_lookup_failure(verify_context: VerifyContext) {
    drop(verify_context);
}

#[scenario(
    path = "tests/features/verify.feature",
    name = "Resolve instance addresses through the yc CLI"
)]
fn scenario_yc_lookup(verify_context: VerifyContext) {
    drop(verify_context);
}
