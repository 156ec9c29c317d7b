//! Acceptance-test scaffolding for Application Load Balancer resources.
//!
//! The crate renders infrastructure configuration for ALB test scenarios,
//! either from `text/template`-style strings ([`template`]) or from a
//! structured block builder ([`hcl`], [`alb`]), and verifies the objects the
//! provisioning step materializes ([`verify`]) against fixture defaults
//! ([`defaults`]) and canonical instance addresses ([`lookup`]).

pub mod alb;
pub mod command;
pub mod defaults;
pub mod duration;
pub mod hcl;
pub mod lookup;
pub mod model;
pub mod names;
pub mod scenario;
pub mod template;
#[cfg(test)]
pub mod test_helpers;
pub mod test_support;
pub mod verify;

pub use alb::{BackendGroupScenario, BaseInfra, HealthcheckKinds, TargetGroupScenario};
pub use command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
pub use defaults::{AlbDefaults, BackendSettings, ConfigError, Fixtures};
pub use duration::{DurationError, HealthcheckDuration};
pub use hcl::{Block, Document, DocumentError, Value};
pub use lookup::{
    AddressLookup, LookupError, StaticAddressLookup, SubnetAddressMap, YcAddressLookup,
};
pub use model::{AppliedResource, AppliedState, BackendGroup, Target, TargetGroup};
pub use names::{NameGenerator, RandomNames, SeededNames};
pub use scenario::{Apply, ScenarioError, ScenarioRunner};
pub use template::{FixtureMap, FixtureValue, RenderError, Template};
pub use verify::{ExpectedBackends, VerificationMismatch, VerifyError};
