// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The instance: a concrete running application on a specific server.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::id::{CatalogId, GroupId, InstanceId, ServerId};

/// What kind of application an instance runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    Docker,
    Eureka,
    Site,
    Service,
    Smf,
    Sysctl,
}

crate::simple_display! {
    AppType {
        Docker => "docker",
        Eureka => "eureka",
        Site => "site",
        Service => "service",
        Smf => "smf",
        Sysctl => "sysctl",
    }
}

/// Observed runtime status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Online,
    Offline,
    Unknown,
    Starting,
    Stopping,
    NoData,
}

crate::simple_display! {
    InstanceStatus {
        Online => "online",
        Offline => "offline",
        Unknown => "unknown",
        Starting => "starting",
        Stopping => "stopping",
        NoData => "no_data",
    }
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn trailing_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_\d+$").expect("constant regex pattern is valid"))
}

/// A concrete running application on a specific server.
///
/// Identity invariant: `(server_id, instance_name, app_type)` is unique
/// among non-deleted rows. Enforced by the Store, not this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub instance_name: String,
    pub instance_number: Option<u32>,
    pub app_type: AppType,
    pub server_id: ServerId,
    pub catalog_id: Option<CatalogId>,
    pub group_id: Option<GroupId>,
    pub status: InstanceStatus,
    pub version: Option<String>,
    pub image: Option<String>,
    pub tag: Option<String>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub distr_path: Option<String>,
    pub custom_playbook_path: Option<String>,
    pub custom_artifact_url: Option<String>,
    pub custom_artifact_extension: Option<String>,
    pub deleted_at: Option<u64>,
}

impl Instance {
    /// The base name with a trailing `_<digits>` instance suffix stripped,
    /// falling back to the attached catalog entry's name when present.
    ///
    /// Mirrors the original's `parse_application_name`: the catalog name
    /// wins over the parsed instance name when both are available.
    pub fn base_name(&self, catalog: Option<&CatalogEntry>) -> String {
        if let Some(catalog) = catalog {
            return catalog.name.clone();
        }
        trailing_number_re()
            .replace(&self.instance_name, "")
            .into_owned()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct InstanceBuilder => Instance {
        set { id: InstanceId = InstanceId::new() }
        into { instance_name: String = "app_1" }
        option { instance_number: u32 = None }
        set { app_type: AppType = AppType::Service }
        set { server_id: ServerId = ServerId::new() }
        option { catalog_id: CatalogId = None }
        option { group_id: GroupId = None }
        set { status: InstanceStatus = InstanceStatus::Unknown }
        option { version: String = None }
        option { image: String = None }
        option { tag: String = None }
        option { ip: String = None }
        option { port: u16 = None }
        option { distr_path: String = None }
        option { custom_playbook_path: String = None }
        option { custom_artifact_url: String = None }
        option { custom_artifact_extension: String = None }
        option { deleted_at: u64 = None }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
