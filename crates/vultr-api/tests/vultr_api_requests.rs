//! Integration tests for request assembly and response handling.
//!
//! Every test runs the real HTTP transport against a local mock server.

use serde_json::json;
use std::collections::HashMap;
use tokio_test::assert_ok;
use vultr_api::{
    Arch, CreateServerRequest, Error, Ipv4Reboot, OsFilter, OsId, PlanId, RegionId,
    RequestParams, ScriptId, ServerId, SnapshotId, SshKeyId, VultrClient,
};
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TOKEN: &str = "EXAMPLEKEY";

fn client_for(server: &MockServer) -> VultrClient {
    VultrClient::builder(TOKEN)
        .unwrap()
        .with_endpoint(format!("{}/v1/", server.uri()))
        .build()
        .unwrap()
}

fn form(request: &Request) -> HashMap<String, String> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

async fn only_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

#[tokio::test]
async fn get_without_params_carries_only_the_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.account_info().await.unwrap();

    let request = only_request(&server).await;
    assert_eq!(request.url.path(), "/v1/account/info");
    assert_eq!(request.url.query(), Some("api_key=EXAMPLEKEY"));
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn every_parameterless_read_has_no_extra_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth_info().await.unwrap();
    client.snapshot_list().await.unwrap();
    client.iso_list().await.unwrap();
    client.plans_list().await.unwrap();
    client.plans_list_vc2().await.unwrap();
    client.plans_list_vdc2().await.unwrap();
    client.regions_list().await.unwrap();
    client.startup_script_list().await.unwrap();
    client.server_list().await.unwrap();
    client.ssh_key_list().await.unwrap();
    client.os_list(&OsFilter::new()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 11);
    for request in requests {
        assert_eq!(request.method.as_str(), "GET");
        assert!(!request.url.as_str().contains('&'), "{}", request.url);
        assert_eq!(request.url.query(), Some("api_key=EXAMPLEKEY"));
    }
}

#[tokio::test]
async fn get_with_params_appends_after_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/server/bandwidth"))
        .and(query_param("api_key", TOKEN))
        .and(query_param("SUBID", "576965"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incoming_bytes": [["2014-06-10", "81072581"]],
            "outgoing_bytes": [["2014-06-10", "4059610"]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let bandwidth = client.server_bandwidth(ServerId::new(576_965)).await.unwrap();
    assert_eq!(bandwidth["incoming_bytes"][0][1], "81072581");

    let request = only_request(&server).await;
    assert_eq!(
        request.url.query(),
        Some("api_key=EXAMPLEKEY&SUBID=576965")
    );
}

#[tokio::test]
async fn post_params_travel_in_body_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let status = client
        .server_reverse_ipv6_set(ServerId::new(576_965), "2001:db8::1", "host.example.com")
        .await
        .unwrap();
    assert_eq!(status, 200);

    let request = only_request(&server).await;
    assert_eq!(request.url.path(), "/v1/server/reverse_set_ipv6");
    assert_eq!(request.url.query(), Some("api_key=EXAMPLEKEY"));
    assert_eq!(
        request
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/x-www-form-urlencoded")
    );

    let body = form(&request);
    assert_eq!(body.len(), 3);
    assert_eq!(body["SUBID"], "576965");
    assert_eq!(body["ip"], "2001:db8::1");
    assert_eq!(body["entry"], "host.example.com");
}

#[tokio::test]
async fn status_operations_map_to_expected_paths_and_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let id = ServerId::new(42);
    let snapshot = SnapshotId::new("5359435d28b9a");
    let key = SshKeyId::new("541b4960f23bd");

    let statuses = vec![
        client.snapshot_destroy(&snapshot).await,
        client
            .startup_script_update(ScriptId::new(3), "boot", "#!/bin/sh")
            .await,
        client.startup_script_destroy(ScriptId::new(3)).await,
        client.server_destroy(id).await,
        client.server_reboot(id).await,
        client.server_halt(id).await,
        client.server_start(id).await,
        client.server_reinstall(id).await,
        client.server_ipv4_create(id, Ipv4Reboot::No).await,
        client.server_ipv4_destroy(id, "203.0.113.9").await,
        client
            .server_reverse_ipv4_set("203.0.113.9", "mail.example.com")
            .await,
        client.server_reverse_ipv4_default(id, "203.0.113.9").await,
        client.server_reverse_ipv6_delete(id, "2001:db8::1").await,
        client.server_label_set(id, "web 01").await,
        client
            .server_restore_backup(id, &"543d34149403a".into())
            .await,
        client.ssh_key_update(&key, "laptop", "ssh-rsa AAAA").await,
        client.ssh_key_destroy(&key).await,
    ];
    for status in statuses {
        assert_eq!(assert_ok!(status), 200);
    }

    let requests = server.received_requests().await.unwrap();
    let seen: Vec<(String, HashMap<String, String>)> = requests
        .iter()
        .map(|request| (request.url.path().to_string(), form(request)))
        .collect();

    let expect = |index: usize, path: &str, pairs: &[(&str, &str)]| {
        let (actual_path, body) = &seen[index];
        assert_eq!(actual_path, path);
        let expected: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        assert_eq!(body, &expected, "{path}");
    };

    expect(0, "/v1/snapshot/destroy", &[("SNAPSHOTID", "5359435d28b9a")]);
    expect(
        1,
        "/v1/startupscript/update",
        &[("SCRIPTID", "3"), ("name", "boot"), ("script", "#!/bin/sh")],
    );
    expect(2, "/v1/startupscript/destroy", &[("SCRIPTID", "3")]);
    expect(3, "/v1/server/destroy", &[("SUBID", "42")]);
    expect(4, "/v1/server/reboot", &[("SUBID", "42")]);
    expect(5, "/v1/server/halt", &[("SUBID", "42")]);
    expect(6, "/v1/server/start", &[("SUBID", "42")]);
    expect(7, "/v1/server/reinstall", &[("SUBID", "42")]);
    expect(8, "/v1/server/create_ipv4", &[("SUBID", "42"), ("reboot", "no")]);
    expect(
        9,
        "/v1/server/destroy_ipv4",
        &[("SUBID", "42"), ("ip", "203.0.113.9")],
    );
    expect(
        10,
        "/v1/server/reverse_set_ipv4",
        &[("ip", "203.0.113.9"), ("entry", "mail.example.com")],
    );
    expect(
        11,
        "/v1/server/reverse_default_ipv4",
        &[("SUBID", "42"), ("ip", "203.0.113.9")],
    );
    expect(
        12,
        "/v1/server/reverse_delete_ipv6",
        &[("SUBID", "42"), ("ip", "2001:db8::1")],
    );
    expect(13, "/v1/server/label_set", &[("SUBID", "42"), ("label", "web 01")]);
    expect(
        14,
        "/v1/server/restore_backup",
        &[("SUBID", "42"), ("BACKUPID", "543d34149403a")],
    );
    expect(
        15,
        "/v1/sshkey/update",
        &[
            ("SSHKEYID", "541b4960f23bd"),
            ("name", "laptop"),
            ("ssh_key", "ssh-rsa AAAA"),
        ],
    );
    expect(16, "/v1/sshkey/destroy", &[("SSHKEYID", "541b4960f23bd")]);
}

#[tokio::test]
async fn status_mode_returns_503_as_a_value() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/server/reboot"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Rate limit exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let status = client.server_reboot(ServerId::new(1)).await.unwrap();
    assert_eq!(status, 503);
}

#[tokio::test]
async fn payload_mode_reports_rate_limit_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/server/list"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.server_list().await.unwrap_err();
    assert!(matches!(err, Error::RateLimited(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn precondition_failure_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/snapshot/create"))
        .respond_with(
            ResponseTemplate::new(412).set_body_string("Unable to create snapshot: server locked"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.snapshot_create(ServerId::new(9)).await.unwrap_err();
    assert_eq!(
        err,
        Error::PreconditionFailed("Unable to create snapshot: server locked".to_string())
    );
}

#[tokio::test]
async fn invalid_api_key_body_means_not_connected() {
    for status in [200u16, 403] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/info"))
            .respond_with(ResponseTemplate::new(status).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(!client.is_connected().await.unwrap());
        let err = client.auth_info().await.unwrap_err();
        assert!(matches!(err, Error::AuthError(_)));
    }
}

#[tokio::test]
async fn valid_key_is_connected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "acls": ["subscriptions", "billing"],
            "email": "example@vultr.com",
            "name": "Example Account"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.is_connected().await.unwrap());
}

#[tokio::test]
async fn non_json_payload_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/regions/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.regions_list().await.unwrap_err();
    assert!(matches!(err, Error::DecodeError(_)));
}

#[tokio::test]
async fn os_list_filters_on_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/os/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "127": {"OSID": 127, "name": "CentOS 6 x64", "arch": "x64", "family": "centos"},
            "147": {"OSID": 147, "name": "CentOS 6 i386", "arch": "i386", "family": "centos"},
            "215": {"OSID": 215, "name": "Ubuntu 16.04 x64", "arch": "x64", "family": "ubuntu"},
            "216": {"OSID": 216, "name": "Ubuntu 16.04 i386", "arch": "i386", "family": "ubuntu"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let x64 = client
        .os_list(&OsFilter::new().with_arch(Arch::X64))
        .await
        .unwrap();
    let x64 = x64.as_object().unwrap();
    assert_eq!(x64.len(), 2);
    assert!(x64.values().all(|os| os["arch"] == "x64"));

    let ubuntu = client
        .os_list(&OsFilter::new().with_family("ubuntu"))
        .await
        .unwrap();
    let ubuntu = ubuntu.as_object().unwrap();
    assert_eq!(ubuntu.len(), 2);
    assert!(ubuntu.values().all(|os| os["family"] == "ubuntu"));

    let both = client
        .os_list(&OsFilter::new().with_family("ubuntu").with_arch(Arch::X64))
        .await
        .unwrap();
    assert_eq!(both.as_object().unwrap().keys().collect::<Vec<_>>(), vec!["215"]);

    // the filter is never sent to the provider
    for request in server.received_requests().await.unwrap() {
        assert_eq!(request.url.query(), Some("api_key=EXAMPLEKEY"));
    }
}

#[tokio::test]
async fn server_available_checks_membership() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/regions/availability"))
        .and(query_param("DCID", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([201, 202])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let region = RegionId::new(1);

    assert_ok!(client.server_available(region, PlanId::new(201)).await);
    assert!(client.is_plan_available(region, PlanId::new(202)).await.unwrap());

    let err = client
        .server_available(region, PlanId::new(999))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::PlanUnavailable {
            plan: 999,
            region: 1
        }
    );
    assert!(!client.is_plan_available(region, PlanId::new(999)).await.unwrap());
}

#[tokio::test]
async fn server_create_without_plan_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([201])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SUBID": "1"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let config = RequestParams::new().with("DCID", 1u64).with("OSID", 127u64);
    let err = client.server_create(&config).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(ref message) if message.contains("VPSPLANID")));

    server.verify().await;
}

#[tokio::test]
async fn server_create_with_unavailable_plan_skips_create_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/regions/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([201, 202])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/server/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SUBID": "1"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = CreateServerRequest::new(RegionId::new(1), PlanId::new(999), OsId::new(127));
    let err = client.server_create_from(&request).await.unwrap_err();
    assert!(matches!(err, Error::PlanUnavailable { plan: 999, region: 1 }));

    server.verify().await;
}

#[tokio::test]
async fn server_create_returns_subid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/regions/availability"))
        .and(query_param("DCID", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([201, 202])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/server/create"))
        .and(body_string("DCID=1&VPSPLANID=201&OSID=127&label=web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SUBID": "1312965"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = CreateServerRequest::new(RegionId::new(1), PlanId::new(201), OsId::new(127))
        .with_label("web");
    let id = client.server_create_from(&request).await.unwrap();
    assert_eq!(id, ServerId::new(1_312_965));
}

#[tokio::test]
async fn server_create_without_subid_is_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/regions/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([201])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/server/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let config = RequestParams::new()
        .with("DCID", "1")
        .with("VPSPLANID", "201")
        .with("OSID", "127");
    let err = client.server_create(&config).await.unwrap_err();
    assert_eq!(err, Error::MissingField("SUBID".to_string()));
}

#[tokio::test]
async fn restore_snapshot_sanitizes_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/server/restore_snapshot"))
        .and(body_string("SUBID=7&SNAPSHOTID=5359435d28b9a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let status = client
        .server_restore_snapshot(ServerId::new(7), &SnapshotId::new("5359-435D-d28b9a; rm"))
        .await
        .unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn startup_script_create_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/startupscript/create"))
        .and(body_string("name=first+boot&script=echo+hi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SCRIPTID": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let id = client
        .startup_script_create("first boot", "echo hi")
        .await
        .unwrap();
    assert_eq!(id, ScriptId::new(5));
}

#[tokio::test]
async fn ssh_key_and_snapshot_create_return_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sshkey/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SSHKEYID": "541b4960f23bd"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/snapshot/create"))
        .and(body_string("SUBID=42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SNAPSHOTID": "544e52f31c706"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let key = client.ssh_key_create("laptop", "ssh-rsa AAAA").await.unwrap();
    assert_eq!(key["SSHKEYID"], "541b4960f23bd");

    let snapshot = client.snapshot_create(ServerId::new(42)).await.unwrap();
    assert_eq!(snapshot["SNAPSHOTID"], "544e52f31c706");
}

#[tokio::test]
async fn ipv4_list_returns_entry_for_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/server/list_ipv4"))
        .and(query_param("SUBID", "576965"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "576965": [
                {"ip": "203.0.113.10", "netmask": "255.255.255.0", "type": "main_ip"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let entry = client
        .server_ipv4_list(ServerId::new(576_965))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry[0]["type"], "main_ip");
}

#[tokio::test]
async fn shared_client_keeps_per_call_state_separate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/server/halt"))
        .respond_with(ResponseTemplate::new(412).set_body_string("server already stopped"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/server/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"42": {"SUBID": "42"}})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut tasks = Vec::new();
    for i in 0..16u64 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let status = client.server_halt(ServerId::new(42)).await.unwrap();
                assert_eq!(status, 412);
            } else {
                let list = client.server_list().await.unwrap();
                assert_eq!(list["42"]["SUBID"], "42");
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn raw_call_uses_catalog_descriptor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/plans/list_vdc2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"115": {"VPSPLANID": "115"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client
        .call(vultr_api::Operation::PlansListVdc2, &RequestParams::new())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        vultr_api::Outcome::Payload(json!({"115": {"VPSPLANID": "115"}}))
    );
}
