//! Asynchronous Vultr API client implementation.

use crate::catalog::{Descriptor, Operation};
use crate::models::{filter_os_list, CreateServerRequest, Ipv4Reboot, OsFilter};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use vultr_core::client::Transport;
use vultr_core::ids::{
    coerce_u64, extract_numeric_id, BackupId, PlanId, RegionId, ScriptId, ServerId, SnapshotId,
    SshKeyId,
};
use vultr_core::{
    Dispatcher, DispatcherBuilder, Error, Outcome, ParamValue, RequestParams, VultrConfig,
};

/// Builder for [`VultrClient`].
#[derive(Debug, Clone)]
pub struct VultrClientBuilder {
    inner: DispatcherBuilder,
}

impl VultrClientBuilder {
    /// Create a builder for the given API token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            inner: DispatcherBuilder::new(token)?,
        })
    }

    /// Replace the whole endpoint configuration.
    #[must_use]
    pub fn with_config(mut self, config: VultrConfig) -> Self {
        self.inner = self.inner.with_config(config);
        self
    }

    /// Override the API base URL, e.g. to point at a mock server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.inner = self.inner.with_endpoint(endpoint);
        self
    }

    /// Override the user agent name.
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.inner = self.inner.with_user_agent(agent);
        self
    }

    /// Override the version appended to the user agent.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.inner = self.inner.with_version(version);
        self
    }

    /// Log verb, URL and status of every request at `info`.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.inner = self.inner.with_debug(debug);
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.inner = self.inner.with_timeout(seconds);
        self
    }

    /// Set whether TLS certificates are verified.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.inner = self.inner.with_tls_verify(verify);
        self
    }

    /// Use a custom transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.inner = self.inner.with_transport(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<VultrClient> {
        let inner = self.inner.build()?;
        Ok(VultrClient { inner })
    }
}

/// Asynchronous Vultr v1 API client.
///
/// Cheap to clone and safe to share between tasks: nothing about an in-flight
/// call is stored on the client.
#[derive(Debug, Clone)]
pub struct VultrClient {
    inner: Dispatcher,
}

impl VultrClient {
    /// Construct a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        VultrClientBuilder::new(token)?.build()
    }

    /// Start building a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the token is empty.
    pub fn builder(token: impl Into<String>) -> Result<VultrClientBuilder> {
        VultrClientBuilder::new(token)
    }

    /// Return the API base URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        self.inner.endpoint()
    }

    /// Invoke a catalog operation with raw parameters.
    ///
    /// # Errors
    ///
    /// Returns transport, classification and decode errors.
    pub async fn call(&self, operation: Operation, params: &RequestParams) -> Result<Outcome> {
        let Descriptor { verb, path, shape } = operation.descriptor();
        debug!(operation = operation.name(), %verb, path, "invoking operation");
        self.inner.dispatch(verb, path, params, shape).await
    }

    // Account

    /// Account balance and charges.
    pub async fn account_info(&self) -> Result<Value> {
        self.payload(Operation::AccountInfo, &RequestParams::new())
            .await
    }

    /// Permissions of the API key.
    pub async fn auth_info(&self) -> Result<Value> {
        self.payload(Operation::AuthInfo, &RequestParams::new())
            .await
    }

    /// Check that the API key is accepted.
    ///
    /// Returns `Ok(false)` when the provider rejects the key; other failures
    /// (network, rate limit, ...) are returned as errors.
    pub async fn is_connected(&self) -> Result<bool> {
        match self.auth_info().await {
            Ok(_) => Ok(true),
            Err(Error::AuthError(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // Catalogs

    /// Operating systems, filtered locally by family and architecture.
    pub async fn os_list(&self, filter: &OsFilter) -> Result<Value> {
        let list = self
            .payload(Operation::OsList, &RequestParams::new())
            .await?;
        Ok(filter_os_list(list, filter))
    }

    /// ISO images on the account.
    pub async fn iso_list(&self) -> Result<Value> {
        self.payload(Operation::IsoList, &RequestParams::new())
            .await
    }

    /// All plans.
    pub async fn plans_list(&self) -> Result<Value> {
        self.payload(Operation::PlansList, &RequestParams::new())
            .await
    }

    /// VC2 plans.
    pub async fn plans_list_vc2(&self) -> Result<Value> {
        self.payload(Operation::PlansListVc2, &RequestParams::new())
            .await
    }

    /// VDC2 plans.
    pub async fn plans_list_vdc2(&self) -> Result<Value> {
        self.payload(Operation::PlansListVdc2, &RequestParams::new())
            .await
    }

    /// Datacenters.
    pub async fn regions_list(&self) -> Result<Value> {
        self.payload(Operation::RegionsList, &RequestParams::new())
            .await
    }

    /// Plans deployable in a region.
    pub async fn regions_availability(&self, region: RegionId) -> Result<Vec<PlanId>> {
        self.availability(Operation::RegionsAvailability, region)
            .await
    }

    /// VC2 plans deployable in a region.
    pub async fn regions_availability_vc2(&self, region: RegionId) -> Result<Vec<PlanId>> {
        self.availability(Operation::RegionsAvailabilityVc2, region)
            .await
    }

    /// VDC2 plans deployable in a region.
    pub async fn regions_availability_vdc2(&self, region: RegionId) -> Result<Vec<PlanId>> {
        self.availability(Operation::RegionsAvailabilityVdc2, region)
            .await
    }

    /// Whether `plan` can be deployed in `region`.
    pub async fn is_plan_available(&self, region: RegionId, plan: PlanId) -> Result<bool> {
        let plans = self.regions_availability(region).await?;
        Ok(plans.contains(&plan))
    }

    /// Fail with [`Error::PlanUnavailable`] unless `plan` can be deployed in `region`.
    pub async fn server_available(&self, region: RegionId, plan: PlanId) -> Result<()> {
        if self.is_plan_available(region, plan).await? {
            Ok(())
        } else {
            Err(Error::PlanUnavailable {
                plan: plan.get(),
                region: region.get(),
            })
        }
    }

    // Snapshots

    /// Snapshots on the account.
    pub async fn snapshot_list(&self) -> Result<Value> {
        self.payload(Operation::SnapshotList, &RequestParams::new())
            .await
    }

    /// Snapshot a server; the payload carries the new `SNAPSHOTID`.
    pub async fn snapshot_create(&self, server: ServerId) -> Result<Value> {
        let params = RequestParams::new().with("SUBID", server.get());
        self.payload(Operation::SnapshotCreate, &params).await
    }

    /// Delete a snapshot.
    pub async fn snapshot_destroy(&self, snapshot: &SnapshotId) -> Result<u16> {
        let params = RequestParams::new().with("SNAPSHOTID", snapshot.as_str());
        self.status(Operation::SnapshotDestroy, &params).await
    }

    // Startup scripts

    /// Startup scripts.
    pub async fn startup_script_list(&self) -> Result<Value> {
        self.payload(Operation::StartupScriptList, &RequestParams::new())
            .await
    }

    /// Create a startup script and return its ID.
    pub async fn startup_script_create(&self, name: &str, script: &str) -> Result<ScriptId> {
        let params = RequestParams::new()
            .with("name", name)
            .with("script", script);
        let payload = self
            .payload(Operation::StartupScriptCreate, &params)
            .await?;
        extract_numeric_id(&payload, "SCRIPTID").map(ScriptId::new)
    }

    /// Replace the name and contents of a startup script.
    pub async fn startup_script_update(
        &self,
        script_id: ScriptId,
        name: &str,
        script: &str,
    ) -> Result<u16> {
        let params = RequestParams::new()
            .with("SCRIPTID", script_id.get())
            .with("name", name)
            .with("script", script);
        self.status(Operation::StartupScriptUpdate, &params).await
    }

    /// Delete a startup script.
    pub async fn startup_script_destroy(&self, script_id: ScriptId) -> Result<u16> {
        let params = RequestParams::new().with("SCRIPTID", script_id.get());
        self.status(Operation::StartupScriptDestroy, &params).await
    }

    // Servers

    /// Servers on the account, keyed by `SUBID`.
    pub async fn server_list(&self) -> Result<Value> {
        self.payload(Operation::ServerList, &RequestParams::new())
            .await
    }

    /// Deploy a server from raw parameters and return its `SUBID`.
    ///
    /// `DCID`, `VPSPLANID` and `OSID` are required; when one is missing or the
    /// plan is not offered in the region nothing is created.
    pub async fn server_create(&self, config: &RequestParams) -> Result<ServerId> {
        for key in ["DCID", "VPSPLANID", "OSID"] {
            if !config.contains_key(key) {
                return Err(Error::InvalidRequest(format!(
                    "missing required server parameter `{key}`"
                )));
            }
        }

        let region = RegionId::new(required_id(config, "DCID")?);
        let plan = PlanId::new(required_id(config, "VPSPLANID")?);
        self.server_available(region, plan).await?;

        let payload = self.payload(Operation::ServerCreate, config).await?;
        extract_numeric_id(&payload, "SUBID").map(ServerId::new)
    }

    /// Deploy a server from a typed request.
    pub async fn server_create_from(&self, request: &CreateServerRequest) -> Result<ServerId> {
        self.server_create(&request.to_params()).await
    }

    /// Delete a server.
    pub async fn server_destroy(&self, server: ServerId) -> Result<u16> {
        self.server_action(Operation::ServerDestroy, server).await
    }

    /// Reboot a server.
    pub async fn server_reboot(&self, server: ServerId) -> Result<u16> {
        self.server_action(Operation::ServerReboot, server).await
    }

    /// Power off a server.
    pub async fn server_halt(&self, server: ServerId) -> Result<u16> {
        self.server_action(Operation::ServerHalt, server).await
    }

    /// Power on a server.
    pub async fn server_start(&self, server: ServerId) -> Result<u16> {
        self.server_action(Operation::ServerStart, server).await
    }

    /// Reinstall the operating system.
    pub async fn server_reinstall(&self, server: ServerId) -> Result<u16> {
        self.server_action(Operation::ServerReinstall, server).await
    }

    /// Change a server label.
    pub async fn server_label_set(&self, server: ServerId, label: &str) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("label", label);
        self.status(Operation::ServerLabelSet, &params).await
    }

    /// Bandwidth history.
    pub async fn server_bandwidth(&self, server: ServerId) -> Result<Value> {
        let params = RequestParams::new().with("SUBID", server.get());
        self.payload(Operation::ServerBandwidth, &params).await
    }

    /// Restore a snapshot onto a server.
    ///
    /// Characters outside `[a-f0-9]` are stripped from the snapshot ID.
    pub async fn server_restore_snapshot(
        &self,
        server: ServerId,
        snapshot: &SnapshotId,
    ) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("SNAPSHOTID", snapshot.sanitized());
        self.status(Operation::ServerRestoreSnapshot, &params).await
    }

    /// Restore a backup onto a server.
    pub async fn server_restore_backup(&self, server: ServerId, backup: &BackupId) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("BACKUPID", backup.as_str());
        self.status(Operation::ServerRestoreBackup, &params).await
    }

    // Server networking

    /// IPv4 addresses of a server, `None` when the reply has no entry for it.
    pub async fn server_ipv4_list(&self, server: ServerId) -> Result<Option<Value>> {
        let params = RequestParams::new().with("SUBID", server.get());
        let payload = self.payload(Operation::ServerIpv4List, &params).await?;
        Ok(entry_for(payload, server))
    }

    /// Add an IPv4 address.
    pub async fn server_ipv4_create(&self, server: ServerId, reboot: Ipv4Reboot) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("reboot", reboot.as_str());
        self.status(Operation::ServerIpv4Create, &params).await
    }

    /// Remove an IPv4 address.
    pub async fn server_ipv4_destroy(&self, server: ServerId, ip: &str) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("ip", ip);
        self.status(Operation::ServerIpv4Destroy, &params).await
    }

    /// Set the reverse DNS entry of an IPv4 address.
    pub async fn server_reverse_ipv4_set(&self, ip: &str, entry: &str) -> Result<u16> {
        let params = RequestParams::new().with("ip", ip).with("entry", entry);
        self.status(Operation::ServerReverseIpv4Set, &params).await
    }

    /// Restore the default reverse DNS entry of an IPv4 address.
    pub async fn server_reverse_ipv4_default(&self, server: ServerId, ip: &str) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("ip", ip);
        self.status(Operation::ServerReverseIpv4Default, &params)
            .await
    }

    /// IPv6 addresses of a server, `None` when the reply has no entry for it.
    pub async fn server_ipv6_list(&self, server: ServerId) -> Result<Option<Value>> {
        let params = RequestParams::new().with("SUBID", server.get());
        let payload = self.payload(Operation::ServerIpv6List, &params).await?;
        Ok(entry_for(payload, server))
    }

    /// Set the reverse DNS entry of an IPv6 address.
    pub async fn server_reverse_ipv6_set(
        &self,
        server: ServerId,
        ip: &str,
        entry: &str,
    ) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("ip", ip)
            .with("entry", entry);
        self.status(Operation::ServerReverseIpv6Set, &params).await
    }

    /// Delete the reverse DNS entry of an IPv6 address.
    pub async fn server_reverse_ipv6_delete(&self, server: ServerId, ip: &str) -> Result<u16> {
        let params = RequestParams::new()
            .with("SUBID", server.get())
            .with("ip", ip);
        self.status(Operation::ServerReverseIpv6Delete, &params)
            .await
    }

    // SSH keys

    /// SSH keys on the account. An account without keys yields an empty payload.
    pub async fn ssh_key_list(&self) -> Result<Value> {
        self.payload(Operation::SshKeyList, &RequestParams::new())
            .await
    }

    /// Upload an OpenSSH public key; the payload carries the new `SSHKEYID`.
    pub async fn ssh_key_create(&self, name: &str, ssh_key: &str) -> Result<Value> {
        let params = RequestParams::new()
            .with("name", name)
            .with("ssh_key", ssh_key);
        self.payload(Operation::SshKeyCreate, &params).await
    }

    /// Replace the name and key material of an SSH key.
    pub async fn ssh_key_update(&self, key: &SshKeyId, name: &str, ssh_key: &str) -> Result<u16> {
        let params = RequestParams::new()
            .with("SSHKEYID", key.as_str())
            .with("name", name)
            .with("ssh_key", ssh_key);
        self.status(Operation::SshKeyUpdate, &params).await
    }

    /// Delete an SSH key.
    pub async fn ssh_key_destroy(&self, key: &SshKeyId) -> Result<u16> {
        let params = RequestParams::new().with("SSHKEYID", key.as_str());
        self.status(Operation::SshKeyDestroy, &params).await
    }

    async fn server_action(&self, operation: Operation, server: ServerId) -> Result<u16> {
        let params = RequestParams::new().with("SUBID", server.get());
        self.status(operation, &params).await
    }

    async fn availability(&self, operation: Operation, region: RegionId) -> Result<Vec<PlanId>> {
        let params = RequestParams::new().with("DCID", region.get());
        let payload = self.payload(operation, &params).await?;
        parse_plan_ids(&payload)
    }

    async fn payload(&self, operation: Operation, params: &RequestParams) -> Result<Value> {
        self.call(operation, params).await?.into_payload()
    }

    async fn status(&self, operation: Operation, params: &RequestParams) -> Result<u16> {
        self.call(operation, params).await?.into_status()
    }
}

fn required_id(config: &RequestParams, key: &str) -> Result<u64> {
    config
        .get(key)
        .and_then(ParamValue::as_integer)
        .and_then(|value| u64::try_from(value).ok())
        .ok_or_else(|| Error::InvalidRequest(format!("server parameter `{key}` must be numeric")))
}

fn parse_plan_ids(payload: &Value) -> Result<Vec<PlanId>> {
    let entries = payload.as_array().ok_or_else(|| {
        Error::DecodeError(format!("expected an array of plan IDs, got `{payload}`"))
    })?;

    entries
        .iter()
        .map(|entry| {
            coerce_u64(entry)
                .map(PlanId::new)
                .ok_or_else(|| Error::DecodeError(format!("invalid plan ID `{entry}`")))
        })
        .collect()
}

fn entry_for(payload: Value, server: ServerId) -> Option<Value> {
    match payload {
        Value::Object(mut entries) => entries.remove(&server.to_string()),
        _ => None,
    }
}
