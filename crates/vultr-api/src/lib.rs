//! Vultr v1 API client.
//!
//! Provides the operation catalog and an asynchronous client covering account,
//! catalog, server, snapshot, startup-script and SSH-key operations. Requests
//! go through the [`vultr_core`] dispatcher.

#![deny(missing_docs)]

pub mod catalog;
pub mod client;
pub mod models;

pub use catalog::{Descriptor, Operation};
pub use client::{VultrClient, VultrClientBuilder};
pub use models::{filter_os_list, Arch, CreateServerRequest, Ipv4Reboot, OsFilter};
pub use vultr_core::ids::{
    AppId, BackupId, IsoId, OsId, PlanId, RegionId, ScriptId, ServerId, SnapshotId, SshKeyId,
};
pub use vultr_core::{Error, Outcome, RequestParams, VultrConfig};

/// Convenient result alias that reuses the shared Vultr error type.
pub type Result<T> = vultr_core::Result<T>;
