//! Scenario driver: render, apply, fetch, verify.
//!
//! The apply step is an external capability. The runner renders the
//! scenario document, hands it to [`Apply`], picks the objects under test out
//! of the returned state by configuration address and runs the verifier on
//! them. Nothing is retried.

use thiserror::Error;

use crate::alb::{
    BACKEND_GROUP_ADDRESS, BACKEND_GROUP_DATA_ADDRESS, BackendGroupScenario,
    TARGET_GROUP_ADDRESS, TARGET_GROUP_DATA_ADDRESS, TargetGroupScenario,
};
use crate::hcl::DocumentError;
use crate::lookup::AddressLookup;
use crate::model::{AppliedState, BackendGroup, TargetGroup};
use crate::verify::{
    VerificationMismatch, VerifyError, verify_backend_group, verify_backend_settings,
    verify_healthcheck_kinds, verify_same_backend_group, verify_same_target_group,
    verify_target_group,
};

/// Provisions a rendered configuration and returns the materialized objects.
pub trait Apply {
    /// Error raised by the provisioning step.
    type Error: std::error::Error;

    /// Applies `document` and waits for convergence.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] when provisioning fails.
    fn apply(&self, document: &str) -> Result<AppliedState, Self::Error>;
}

/// Errors raised while driving a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError<A, L> {
    /// The scenario document is invalid.
    #[error(transparent)]
    Render(#[from] DocumentError),
    /// The apply step failed.
    #[error("apply failed: {0}")]
    Apply(#[source] A),
    /// The applied state lacks an object the scenario declared.
    #[error("applied state has no {kind} at {address}")]
    MissingResource {
        /// Expected object kind.
        kind: &'static str,
        /// Configuration address.
        address: String,
    },
    /// An object failed verification.
    #[error(transparent)]
    Verify(#[from] VerificationMismatch),
    /// Address lookup failed; the lookup error is reported as is.
    #[error(transparent)]
    Lookup(L),
}

impl<A, L> From<VerifyError<L>> for ScenarioError<A, L> {
    fn from(value: VerifyError<L>) -> Self {
        match value {
            VerifyError::Mismatch(mismatch) => Self::Verify(mismatch),
            VerifyError::Lookup(err) => Self::Lookup(err),
        }
    }
}

/// Drives scenarios through an apply step and an address lookup.
#[derive(Clone, Debug)]
pub struct ScenarioRunner<A, L> {
    apply: A,
    lookup: L,
}

impl<A: Apply, L: AddressLookup> ScenarioRunner<A, L> {
    /// Creates a runner.
    #[must_use]
    pub const fn new(apply: A, lookup: L) -> Self {
        Self { apply, lookup }
    }

    fn target_group<'s>(
        state: &'s AppliedState,
        address: &str,
    ) -> Result<&'s TargetGroup, ScenarioError<A::Error, L::Error>> {
        state
            .target_group(address)
            .ok_or_else(|| ScenarioError::MissingResource {
                kind: "target group",
                address: address.to_owned(),
            })
    }

    fn backend_group<'s>(
        state: &'s AppliedState,
        address: &str,
    ) -> Result<&'s BackendGroup, ScenarioError<A::Error, L::Error>> {
        state
            .backend_group(address)
            .ok_or_else(|| ScenarioError::MissingResource {
                kind: "backend group",
                address: address.to_owned(),
            })
    }

    fn apply(&self, document: &str) -> Result<AppliedState, ScenarioError<A::Error, L::Error>> {
        self.apply.apply(document).map_err(ScenarioError::Apply)
    }

    /// Runs a target group scenario and returns the applied state.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] for the first failing step.
    pub fn run_target_group(
        &self,
        scenario: &TargetGroupScenario,
    ) -> Result<AppliedState, ScenarioError<A::Error, L::Error>> {
        let document = scenario.document().render()?;
        tracing::info!(group = scenario.name(), "applying target group scenario");
        let state = self.apply(&document)?;

        let group = Self::target_group(&state, TARGET_GROUP_ADDRESS)?;
        verify_target_group(group, &scenario.expected_instance_names(), &self.lookup)?;
        if scenario.has_data_source() {
            let data_source = Self::target_group(&state, TARGET_GROUP_DATA_ADDRESS)?;
            verify_same_target_group(group, data_source)?;
        }
        tracing::info!(group = scenario.name(), "target group scenario verified");
        Ok(state)
    }

    /// Runs a backend group scenario and returns the applied state.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] for the first failing step.
    pub fn run_backend_group(
        &self,
        scenario: &BackendGroupScenario,
    ) -> Result<AppliedState, ScenarioError<A::Error, L::Error>> {
        let document = scenario.document().render()?;
        tracing::info!(group = scenario.name(), "applying backend group scenario");
        let state = self.apply(&document)?;

        let group = Self::backend_group(&state, BACKEND_GROUP_ADDRESS)?;
        verify_backend_group(group, scenario.expected_backends())?;
        verify_backend_settings(group, scenario.settings())?;
        verify_healthcheck_kinds(group, scenario.healthchecks())?;
        if scenario.has_data_source() {
            let data_source = Self::backend_group(&state, BACKEND_GROUP_DATA_ADDRESS)?;
            verify_same_backend_group(group, data_source)?;
        }
        tracing::info!(group = scenario.name(), "backend group scenario verified");
        Ok(state)
    }
}
