//! Static table of provider operations.
//!
//! Each [`Operation`] maps to a [`Descriptor`]: the verb, the path relative to
//! the API base URL, and the result shape the dispatcher should produce.

use vultr_core::{ResultShape, Verb};

/// How one operation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// HTTP verb
    pub verb: Verb,
    /// Path relative to the API base URL
    pub path: &'static str,
    /// Decoded payload or raw status
    pub shape: ResultShape,
}

impl Descriptor {
    const fn read(path: &'static str) -> Self {
        Self {
            verb: Verb::Get,
            path,
            shape: ResultShape::Payload,
        }
    }

    const fn write(path: &'static str) -> Self {
        Self {
            verb: Verb::Post,
            path,
            shape: ResultShape::Payload,
        }
    }

    const fn action(path: &'static str) -> Self {
        Self {
            verb: Verb::Post,
            path,
            shape: ResultShape::StatusCode,
        }
    }
}

macro_rules! operations {
    ($($(#[$meta:meta])* $variant:ident => $kind:ident($path:literal),)+) => {
        /// Every operation of the v1 API exposed by this crate.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($(#[$meta])* $variant,)+
        }

        impl Operation {
            /// All operations, in declaration order.
            pub const ALL: &'static [Operation] = &[$(Operation::$variant,)+];

            /// Verb, path and result shape for this operation.
            #[must_use]
            pub const fn descriptor(self) -> Descriptor {
                match self {
                    $(Self::$variant => Descriptor::$kind($path),)+
                }
            }

            /// Operation name, used in log fields.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

operations! {
    /// Account balance and pending charges
    AccountInfo => read("account/info"),
    /// API key permissions
    AuthInfo => read("auth/info"),
    /// Available operating systems
    OsList => read("os/list"),
    /// Snapshots on the account
    SnapshotList => read("snapshot/list"),
    /// Snapshot a server
    SnapshotCreate => write("snapshot/create"),
    /// Delete a snapshot
    SnapshotDestroy => action("snapshot/destroy"),
    /// ISO images on the account
    IsoList => read("iso/list"),
    /// All plans
    PlansList => read("plans/list"),
    /// VC2 plans
    PlansListVc2 => read("plans/list_vc2"),
    /// VDC2 plans
    PlansListVdc2 => read("plans/list_vdc2"),
    /// Datacenters
    RegionsList => read("regions/list"),
    /// Plan IDs available in a datacenter
    RegionsAvailability => read("regions/availability"),
    /// VC2 plan IDs available in a datacenter
    RegionsAvailabilityVc2 => read("regions/availability_vc2"),
    /// VDC2 plan IDs available in a datacenter
    RegionsAvailabilityVdc2 => read("regions/availability_vdc2"),
    /// Startup scripts
    StartupScriptList => read("startupscript/list"),
    /// Create a startup script
    StartupScriptCreate => write("startupscript/create"),
    /// Replace a startup script
    StartupScriptUpdate => action("startupscript/update"),
    /// Delete a startup script
    StartupScriptDestroy => action("startupscript/destroy"),
    /// Servers on the account
    ServerList => read("server/list"),
    /// Deploy a server
    ServerCreate => write("server/create"),
    /// Delete a server
    ServerDestroy => action("server/destroy"),
    /// Reboot a server
    ServerReboot => action("server/reboot"),
    /// Power off a server
    ServerHalt => action("server/halt"),
    /// Power on a server
    ServerStart => action("server/start"),
    /// Reinstall the operating system
    ServerReinstall => action("server/reinstall"),
    /// IPv4 addresses of a server
    ServerIpv4List => read("server/list_ipv4"),
    /// Add an IPv4 address
    ServerIpv4Create => action("server/create_ipv4"),
    /// Remove an IPv4 address
    ServerIpv4Destroy => action("server/destroy_ipv4"),
    /// Set IPv4 reverse DNS
    ServerReverseIpv4Set => action("server/reverse_set_ipv4"),
    /// Restore default IPv4 reverse DNS
    ServerReverseIpv4Default => action("server/reverse_default_ipv4"),
    /// IPv6 addresses of a server
    ServerIpv6List => read("server/list_ipv6"),
    /// Set IPv6 reverse DNS
    ServerReverseIpv6Set => action("server/reverse_set_ipv6"),
    /// Delete IPv6 reverse DNS
    ServerReverseIpv6Delete => action("server/reverse_delete_ipv6"),
    /// Change a server label
    ServerLabelSet => action("server/label_set"),
    /// Bandwidth history
    ServerBandwidth => read("server/bandwidth"),
    /// Restore a snapshot onto a server
    ServerRestoreSnapshot => action("server/restore_snapshot"),
    /// Restore a backup onto a server
    ServerRestoreBackup => action("server/restore_backup"),
    /// SSH keys
    SshKeyList => read("sshkey/list"),
    /// Upload an SSH key
    SshKeyCreate => write("sshkey/create"),
    /// Replace an SSH key
    SshKeyUpdate => action("sshkey/update"),
    /// Delete an SSH key
    SshKeyDestroy => action("sshkey/destroy"),
}
