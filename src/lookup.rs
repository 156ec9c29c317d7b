//! Canonical address lookup for compute instances.
//!
//! Target verification compares the addresses an ALB reports against the
//! addresses the compute API assigned to the instances the scenario created.
//! [`YcAddressLookup`] asks the `yc` CLI for each instance; the static lookup
//! serves recorded answers.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;

use serde::Deserialize;
use thiserror::Error;

use crate::command::{CommandError, CommandOutput, CommandRunner};

/// Default Yandex Cloud CLI binary name.
pub const DEFAULT_YC_BIN: &str = "yc";

/// Mapping from subnet identifier to the set of addresses valid in it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct SubnetAddressMap(BTreeMap<String, BTreeSet<String>>);

impl SubnetAddressMap {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `address` as valid within `subnet_id`.
    pub fn insert(&mut self, subnet_id: impl Into<String>, address: impl Into<String>) {
        self.0
            .entry(subnet_id.into())
            .or_default()
            .insert(address.into());
    }

    /// Valid addresses of a subnet, if the subnet is known.
    #[must_use]
    pub fn addresses(&self, subnet_id: &str) -> Option<&BTreeSet<String>> {
        self.0.get(subnet_id)
    }

    /// Number of known subnets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no subnet is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S, A> FromIterator<(S, A)> for SubnetAddressMap
where
    S: Into<String>,
    A: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, A)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (subnet_id, address) in iter {
            map.insert(subnet_id, address);
        }
        map
    }
}

/// Errors raised while resolving instance addresses.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LookupError {
    /// Raised when the instance is not known to the lookup.
    #[error("unknown instance {name}")]
    UnknownInstance {
        /// Instance name that failed to resolve.
        name: String,
    },
    /// Raised when the CLI returns a non-zero exit status.
    #[error("{program} exited with status {status_text} for instance {name}: {stderr}")]
    CommandFailure {
        /// Program that failed.
        program: String,
        /// Instance being looked up.
        name: String,
        /// Human readable exit status.
        status_text: String,
        /// Stderr captured from the command.
        stderr: String,
    },
    /// Raised when CLI output cannot be parsed.
    #[error("failed to parse instance {name}: {message}")]
    Parse {
        /// Instance being looked up.
        name: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when command execution fails.
    #[error(transparent)]
    Runner(#[from] CommandError),
}

/// Resolves instance names into the subnet-to-address mapping.
pub trait AddressLookup {
    /// Error produced when resolution fails.
    type Error: std::error::Error;

    /// Builds the mapping for every instance in `names`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] when any name cannot be resolved.
    fn subnet_addresses(&self, names: &[String]) -> Result<SubnetAddressMap, Self::Error>;
}

/// One network interface of an instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct InterfaceAddress {
    /// Subnet the interface is attached to.
    pub subnet_id: String,
    /// Primary IPv4 address.
    pub address: String,
}

/// Lookup over recorded instance interfaces, loadable from JSON of the form
/// `{"tf-instance-1": [{"subnet_id": "...", "address": "..."}]}`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct StaticAddressLookup(BTreeMap<String, Vec<InterfaceAddress>>);

impl StaticAddressLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an interface for `name`.
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        subnet_id: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.0.entry(name.into()).or_default().push(InterfaceAddress {
            subnet_id: subnet_id.into(),
            address: address.into(),
        });
        self
    }

    /// Parses recorded interfaces from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload does not match.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl AddressLookup for StaticAddressLookup {
    type Error = LookupError;

    fn subnet_addresses(&self, names: &[String]) -> Result<SubnetAddressMap, LookupError> {
        let mut map = SubnetAddressMap::new();
        for name in names {
            let interfaces = self
                .0
                .get(name)
                .ok_or_else(|| LookupError::UnknownInstance { name: name.clone() })?;
            for interface in interfaces {
                map.insert(interface.subnet_id.as_str(), interface.address.as_str());
            }
        }
        Ok(map)
    }
}

/// Looks instances up through `yc compute instance get`.
#[derive(Clone, Debug)]
pub struct YcAddressLookup<R: CommandRunner> {
    yc_bin: String,
    folder_id: Option<String>,
    runner: R,
}

impl<R: CommandRunner> YcAddressLookup<R> {
    /// Creates a lookup using `yc_bin` and the provided runner.
    #[must_use]
    pub fn new(yc_bin: impl Into<String>, runner: R) -> Self {
        Self {
            yc_bin: yc_bin.into(),
            folder_id: None,
            runner,
        }
    }

    /// Scopes lookups to a folder instead of the CLI profile default.
    #[must_use]
    pub fn with_folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    fn build_get_args(&self, name: &str) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("compute"),
            OsString::from("instance"),
            OsString::from("get"),
            OsString::from("--name"),
            OsString::from(name),
        ];
        if let Some(folder_id) = &self.folder_id {
            args.push(OsString::from("--folder-id"));
            args.push(OsString::from(folder_id));
        }
        args.push(OsString::from("--format"));
        args.push(OsString::from("json"));
        args
    }

    fn check_output(&self, output: CommandOutput, name: &str) -> Result<String, LookupError> {
        output
            .into_stdout()
            .map_err(|failed| LookupError::CommandFailure {
                program: self.yc_bin.clone(),
                name: name.to_owned(),
                status_text: failed.status_text(),
                stderr: failed.stderr.trim().to_owned(),
            })
    }

    fn instance(&self, name: &str) -> Result<YcInstance, LookupError> {
        let output = self.runner.run(&self.yc_bin, &self.build_get_args(name))?;
        let stdout = self.check_output(output, name)?;
        serde_json::from_str(&stdout).map_err(|err| LookupError::Parse {
            name: name.to_owned(),
            message: err.to_string(),
        })
    }
}

impl<R: CommandRunner> AddressLookup for YcAddressLookup<R> {
    type Error = LookupError;

    fn subnet_addresses(&self, names: &[String]) -> Result<SubnetAddressMap, LookupError> {
        let mut map = SubnetAddressMap::new();
        for name in names {
            let instance = self.instance(name)?;
            tracing::debug!(
                instance = %name,
                interfaces = instance.network_interfaces.len(),
                "resolved instance addresses"
            );
            for interface in instance.network_interfaces {
                // IPv6-only interfaces carry no primary v4 address.
                if let Some(primary) = interface.primary_v4_address {
                    map.insert(interface.subnet_id, primary.address);
                }
            }
        }
        Ok(map)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct YcInstance {
    #[serde(default)]
    network_interfaces: Vec<YcNetworkInterface>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct YcNetworkInterface {
    subnet_id: String,
    #[serde(default)]
    primary_v4_address: Option<YcAddress>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct YcAddress {
    address: String,
}
