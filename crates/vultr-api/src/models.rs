//! Client-side request models and filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use vultr_core::ids::{AppId, IsoId, OsId, PlanId, RegionId, ScriptId, SnapshotId, SshKeyId};
use vultr_core::RequestParams;

/// Operating system architecture as reported by `os/list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 32-bit
    I386,
    /// 64-bit
    X64,
}

impl Arch {
    /// Map a bit width to an architecture; only 32 and 64 are known.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(Self::I386),
            64 => Some(Self::X64),
            _ => None,
        }
    }

    /// Provider spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::I386 => "i386",
            Self::X64 => "x64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side filter applied to the `os/list` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsFilter {
    /// Keep only this family (e.g. `ubuntu`)
    pub family: Option<String>,
    /// Keep only this architecture
    pub arch: Option<Arch>,
}

impl OsFilter {
    /// Filter that keeps everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a family.
    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Restrict to an architecture.
    #[must_use]
    pub const fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Returns true when no restriction is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.family.is_none() && self.arch.is_none()
    }

    /// Entries lacking the `arch` or `family` field are kept.
    #[must_use]
    pub fn matches(&self, entry: &Value) -> bool {
        let arch_ok = match (self.arch, entry.get("arch").and_then(Value::as_str)) {
            (Some(arch), Some(actual)) => actual == arch.as_str(),
            _ => true,
        };
        let family_ok = match (
            self.family.as_deref(),
            entry.get("family").and_then(Value::as_str),
        ) {
            (Some(family), Some(actual)) => actual == family,
            _ => true,
        };
        arch_ok && family_ok
    }
}

/// Drop `os/list` entries that do not match `filter`.
///
/// The provider returns an object keyed by `OSID`; arrays are handled the same
/// way. Any other value is returned unchanged.
#[must_use]
pub fn filter_os_list(list: Value, filter: &OsFilter) -> Value {
    if filter.is_empty() {
        return list;
    }

    match list {
        Value::Object(mut entries) => {
            entries.retain(|_, entry| filter.matches(entry));
            Value::Object(entries)
        }
        Value::Array(mut entries) => {
            entries.retain(|entry| filter.matches(entry));
            Value::Array(entries)
        }
        other => other,
    }
}

/// Whether adding an IPv4 address reboots the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ipv4Reboot {
    /// Reboot immediately so the address is configured
    #[default]
    Yes,
    /// Leave the server running
    No,
}

impl Ipv4Reboot {
    /// Provider spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Typed parameters for `server/create`.
///
/// Converts into the raw [`RequestParams`] accepted by
/// [`VultrClient::server_create`](crate::VultrClient::server_create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServerRequest {
    /// Datacenter
    pub region: RegionId,
    /// VPS plan
    pub plan: PlanId,
    /// Operating system
    pub os: OsId,
    /// Display label
    pub label: Option<String>,
    /// Hostname set on the instance
    pub hostname: Option<String>,
    /// Startup script run on first boot
    pub script: Option<ScriptId>,
    /// Snapshot to deploy from (OS must be "Snapshot")
    pub snapshot: Option<SnapshotId>,
    /// ISO to boot from (OS must be "Custom")
    pub iso: Option<IsoId>,
    /// Application to deploy (OS must be "Application")
    pub app: Option<AppId>,
    /// SSH keys installed on the instance
    pub ssh_keys: Vec<SshKeyId>,
    /// Assign an IPv6 subnet
    pub enable_ipv6: bool,
    /// Attach to the private network
    pub enable_private_network: bool,
    /// Enable automatic backups
    pub auto_backups: bool,
    /// Send the activation email
    pub notify_activate: Option<bool>,
    /// Tag
    pub tag: Option<String>,
    /// Base64 cloud-init user data
    pub user_data: Option<String>,
}

impl CreateServerRequest {
    /// Request with only the required fields.
    #[must_use]
    pub const fn new(region: RegionId, plan: PlanId, os: OsId) -> Self {
        Self {
            region,
            plan,
            os,
            label: None,
            hostname: None,
            script: None,
            snapshot: None,
            iso: None,
            app: None,
            ssh_keys: Vec::new(),
            enable_ipv6: false,
            enable_private_network: false,
            auto_backups: false,
            notify_activate: None,
            tag: None,
            user_data: None,
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the hostname.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Run a startup script on first boot.
    #[must_use]
    pub const fn with_script(mut self, script: ScriptId) -> Self {
        self.script = Some(script);
        self
    }

    /// Deploy from a snapshot.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: SnapshotId) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Boot from an ISO.
    #[must_use]
    pub const fn with_iso(mut self, iso: IsoId) -> Self {
        self.iso = Some(iso);
        self
    }

    /// Deploy an application.
    #[must_use]
    pub const fn with_app(mut self, app: AppId) -> Self {
        self.app = Some(app);
        self
    }

    /// Install an SSH key.
    #[must_use]
    pub fn with_ssh_key(mut self, key: SshKeyId) -> Self {
        self.ssh_keys.push(key);
        self
    }

    /// Assign an IPv6 subnet.
    #[must_use]
    pub const fn with_ipv6(mut self, enabled: bool) -> Self {
        self.enable_ipv6 = enabled;
        self
    }

    /// Attach to the private network.
    #[must_use]
    pub const fn with_private_network(mut self, enabled: bool) -> Self {
        self.enable_private_network = enabled;
        self
    }

    /// Enable automatic backups.
    #[must_use]
    pub const fn with_auto_backups(mut self, enabled: bool) -> Self {
        self.auto_backups = enabled;
        self
    }

    /// Control the activation email.
    #[must_use]
    pub const fn with_notify_activate(mut self, notify: bool) -> Self {
        self.notify_activate = Some(notify);
        self
    }

    /// Set the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set base64-encoded cloud-init user data.
    #[must_use]
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    /// Wire parameters in provider naming.
    #[must_use]
    pub fn to_params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        params.push("DCID", self.region.get());
        params.push("VPSPLANID", self.plan.get());
        params.push("OSID", self.os.get());
        params.push_opt("label", self.label.as_deref());
        params.push_opt("hostname", self.hostname.as_deref());
        params.push_opt("SCRIPTID", self.script.map(ScriptId::get));
        params.push_opt("SNAPSHOTID", self.snapshot.as_ref().map(SnapshotId::as_str));
        params.push_opt("ISOID", self.iso.map(IsoId::get));
        params.push_opt("APPID", self.app.map(AppId::get));
        if !self.ssh_keys.is_empty() {
            let keys: Vec<&str> = self.ssh_keys.iter().map(SshKeyId::as_str).collect();
            params.push("SSHKEYID", keys.join(","));
        }
        if self.enable_ipv6 {
            params.push("enable_ipv6", "yes");
        }
        if self.enable_private_network {
            params.push("enable_private_network", "yes");
        }
        if self.auto_backups {
            params.push("auto_backups", "yes");
        }
        params.push_opt(
            "notify_activate",
            self.notify_activate.map(|notify| if notify { "yes" } else { "no" }),
        );
        params.push_opt("tag", self.tag.as_deref());
        params.push_opt("userdata", self.user_data.as_deref());

        params
    }
}

impl From<&CreateServerRequest> for RequestParams {
    fn from(request: &CreateServerRequest) -> Self {
        request.to_params()
    }
}
