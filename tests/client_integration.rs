//! Integration tests against a mocked cluster-manager server
//!
//! These tests drive the real [`Client`] against wiremock endpoints,
//! covering login, lazy record caching, filtered lookups, pagination,
//! version-gated addressing and task polling.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stackware_client::{Client, Error, Filter, Paging, RunParams, UpdateMode};

/// A server new enough for every version-gated operation.
const MODERN: &str = "2021.03.12.16";
/// A supported but old server: services and components are not yet
/// top-level and the `verbose` run argument does not exist.
const LEGACY: &str = "2020.01.01.00";

/// Mount the login and version-probe endpoints and connect.
async fn connect(server: &MockServer, version: &str) -> Client {
    Mock::given(method("POST"))
        .and(path("/api/v1/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "secret"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/info/"))
        .and(header("Authorization", "Token secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": version})))
        .mount(server)
        .await;

    Client::connect(&server.uri(), "admin", "admin")
        .await
        .expect("connect should succeed")
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

mod connect_tests {
    use super::*;

    /// Bad credentials surface as an authentication error, not a raw
    /// API error.
    #[tokio::test]
    async fn test_bad_credentials_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/token/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "AUTH_ERROR",
                "level": "error",
                "desc": "Wrong user or password",
            })))
            .mount(&server)
            .await;

        let err = Client::connect(&server.uri(), "admin", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got {err:?}");
    }

    /// A server older than the supported minimum is refused at connect
    /// time.
    #[tokio::test]
    async fn test_ancient_server_is_refused() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/token/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "secret"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/info/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"version": "2018.01.01.00"})),
            )
            .mount(&server)
            .await;

        let err = Client::connect(&server.uri(), "admin", "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }), "got {err:?}");
    }

    /// The probed version is kept on the client.
    #[tokio::test]
    async fn test_server_version_is_probed() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;
        assert_eq!(client.server_version().as_str(), MODERN);
    }

    /// Debug formatting identifies handles without leaking the token.
    #[tokio::test]
    async fn test_debug_output_omits_token() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        let rendered = format!("{client:?}");
        assert!(rendered.contains(MODERN), "got: {rendered}");
        assert!(!rendered.contains("secret"), "got: {rendered}");

        let cluster = client.cluster(7).expect("handle");
        let rendered = format!("{cluster:?}");
        assert!(rendered.contains("cluster"), "got: {rendered}");
        assert!(rendered.contains('7'), "got: {rendered}");
    }
}

mod navigation_tests {
    use super::*;

    /// A cluster reaches its bundle through the prototype's record.
    #[tokio::test]
    async fn test_cluster_bundle_via_prototype() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "name": "prod", "prototype_id": 5,
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/stack/cluster/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5, "name": "warehouse", "type": "cluster", "bundle_id": 3,
            })))
            .mount(&server)
            .await;

        let mut cluster = client.cluster(1).expect("handle");
        let bundle = cluster.bundle().await.expect("bundle nav");
        assert_eq!(bundle.id(), 3);
    }

    /// Bundle removal goes through the same stack route the entity
    /// declares for reads.
    #[tokio::test]
    async fn test_bundle_delete_uses_stack_route() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/stack/bundle/9/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client.bundle_delete(9).await.expect("delete");
    }
}

mod record_cache_tests {
    use super::*;

    /// Creating a handle performs no request; the record is fetched on
    /// first access and a reread replaces the cache wholesale, so a
    /// field the server dropped disappears.
    #[tokio::test]
    async fn test_lazy_fetch_and_wholesale_reread() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "name": "prod", "description": "old text",
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "prod"})),
            )
            .mount(&server)
            .await;

        let mut cluster = client.cluster(1).expect("handle");
        // Only login and probe so far.
        assert_eq!(request_count(&server).await, 2);

        let record = cluster.record().await.expect("first fetch");
        assert_eq!(record.description.as_deref(), Some("old text"));
        assert_eq!(request_count(&server).await, 3);

        // Cached: no extra request.
        cluster.record().await.expect("cached");
        assert_eq!(request_count(&server).await, 3);

        let record = cluster.reread().await.expect("reread");
        assert_eq!(record.description, None);
    }

    /// A mutation drops the cache; the next read fetches the server's
    /// state instead of patching locally.
    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "before"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/cluster/1/"))
            .and(body_json(json!({"name": "after"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "after"})),
            )
            .mount(&server)
            .await;

        let mut cluster = client.cluster(1).expect("handle");
        assert_eq!(
            cluster.record().await.expect("fetch").name.as_deref(),
            Some("before")
        );

        cluster
            .update(json!({"name": "after"}), UpdateMode::Partial)
            .await
            .expect("update");
        assert_eq!(
            cluster.record().await.expect("refetch").name.as_deref(),
            Some("after")
        );
    }

    /// A direct 404 on the instance path is the same "nothing matched"
    /// outcome as an empty search.
    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/77/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "CLUSTER_NOT_FOUND",
                "level": "error",
                "desc": "cluster does not exist",
            })))
            .mount(&server)
            .await;

        let mut cluster = client.cluster(77).expect("handle");
        let err = cluster.record().await.unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }
}

mod lookup_tests {
    use super::*;

    /// A filtered lookup returning exactly one record succeeds.
    #[tokio::test]
    async fn test_find_single_match() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/"))
            .and(query_param("name", "prod"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 3, "name": "prod"}])),
            )
            .mount(&server)
            .await;

        let cluster = client
            .cluster_find(Filter::new().field("name", "prod"))
            .await
            .expect("find");
        assert_eq!(cluster.id(), 3);
    }

    /// Zero matches fail the lookup.
    #[tokio::test]
    async fn test_find_no_match_is_not_found() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/"))
            .and(query_param("name", "missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = client
            .cluster_find(Filter::new().field("name", "missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    /// More than one match fails a lookup that assumes uniqueness.
    #[tokio::test]
    async fn test_find_ambiguous_is_too_many() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/"))
            .and(query_param("name", "dup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "dup"},
                {"id": 2, "name": "dup"},
            ])))
            .mount(&server)
            .await;

        let err = client
            .cluster_find(Filter::new().field("name", "dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TooManyResults("cluster")), "got {err:?}");
    }

    /// An undeclared filter key is rejected before any request is made.
    #[tokio::test]
    async fn test_undeclared_filter_rejected_locally() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;
        let before = request_count(&server).await;

        let err = client
            .cluster_list(Filter::new().field("bogus", "x"), None)
            .err()
            .expect("must fail");
        assert!(
            matches!(err, Error::UnsupportedFilter { entity: "cluster", .. }),
            "got {err:?}"
        );
        assert_eq!(request_count(&server).await, before);
    }
}

mod paging_tests {
    use super::*;

    /// With explicit paging the window advances by `limit` until the
    /// envelope reports no further page; all items come back in server
    /// order.
    #[tokio::test]
    async fn test_walks_all_pages() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/host/"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": "http://x/api/v1/host/?limit=2&offset=2",
                "previous": null,
                "results": [{"id": 1, "fqdn": "h1"}, {"id": 2, "fqdn": "h2"}],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/host/"))
            .and(query_param("offset", "2"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": null,
                "previous": "http://x/api/v1/host/?limit=2",
                "results": [{"id": 3, "fqdn": "h3"}],
            })))
            .mount(&server)
            .await;

        let hosts = client
            .host_list(Filter::new(), Some(Paging::new(0, 2)))
            .expect("collection")
            .all()
            .await
            .expect("all pages");
        let ids: Vec<u64> = hosts.iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// Without paging a single request returns the complete set, and
    /// list entries arrive primed: reading a record costs no request.
    #[tokio::test]
    async fn test_unpaged_list_is_one_request() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/host/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "fqdn": "h1"},
                {"id": 2, "fqdn": "h2"},
            ])))
            .mount(&server)
            .await;

        let before = request_count(&server).await;
        let mut hosts = client
            .host_list(Filter::new(), None)
            .expect("collection")
            .all()
            .await
            .expect("all");
        assert_eq!(hosts.len(), 2);
        assert_eq!(request_count(&server).await, before + 1);

        let record = hosts[0].record().await.expect("primed record");
        assert_eq!(record.fqdn.as_deref(), Some("h1"));
        assert_eq!(request_count(&server).await, before + 1);
    }
}

mod version_gate_tests {
    use super::*;

    /// Addressing a service top-level on an old server fails locally,
    /// before any network traffic.
    #[tokio::test]
    async fn test_top_level_service_gated_locally() {
        let server = MockServer::start().await;
        let client = connect(&server, LEGACY).await;
        let before = request_count(&server).await;

        let err = client.service(3).err().expect("must fail");
        assert!(matches!(err, Error::VersionMismatch { .. }), "got {err:?}");
        let err = client.component(4).err().expect("must fail");
        assert!(matches!(err, Error::VersionMismatch { .. }), "got {err:?}");
        let err = client
            .component_list(Filter::new(), None)
            .err()
            .expect("must fail");
        assert!(matches!(err, Error::VersionMismatch { .. }), "got {err:?}");
        assert_eq!(request_count(&server).await, before);
    }

    /// On a modern server cluster services live behind the top-level
    /// route, filtered by cluster id.
    #[tokio::test]
    async fn test_modern_service_addressing() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/service/"))
            .and(query_param("cluster_id", "1"))
            .and(query_param("name", "storage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 9, "name": "storage", "cluster_id": 1},
            ])))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let service = cluster
            .service_find(Filter::new().field("name", "storage"))
            .await
            .expect("find");
        assert_eq!(service.id(), 9);
    }

    /// On a legacy server the same lookup nests under the cluster
    /// instance path.
    #[tokio::test]
    async fn test_legacy_service_addressing() {
        let server = MockServer::start().await;
        let client = connect(&server, LEGACY).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/service/"))
            .and(query_param("name", "storage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 9, "name": "storage", "cluster_id": 1},
            ])))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let service = cluster
            .service_find(Filter::new().field("name", "storage"))
            .await
            .expect("find");
        assert_eq!(service.id(), 9);
    }
}

mod action_tests {
    use super::*;

    /// Running an action with no explicit config derives the payload
    /// from the declared schema and returns a task handle.
    #[tokio::test]
    async fn test_run_returns_task() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/action/10/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 10,
                "name": "start",
                "config": {"config": [
                    {"type": "string", "name": "mode", "subname": "", "value": "safe"},
                ]},
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cluster/1/action/10/run/"))
            .and(body_json(json!({"config": {"mode": "safe"}, "verbose": false})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let mut action = cluster.action(10).expect("action handle");
        let task = action.run(RunParams::new()).await.expect("run");
        assert_eq!(task.id(), 99);
    }

    /// Old servers reject unknown run arguments, so `verbose` is left
    /// out of the payload entirely.
    #[tokio::test]
    async fn test_verbose_not_sent_to_legacy_server() {
        let server = MockServer::start().await;
        let client = connect(&server, LEGACY).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/action/10/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 10, "name": "start", "config": {"config": []},
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cluster/1/action/10/run/"))
            .and(body_json(json!({"config": {}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let mut action = cluster.action(10).expect("action handle");
        let task = action
            .run(RunParams::new().verbose(true))
            .await
            .expect("run");
        assert_eq!(task.id(), 99);
    }

    /// A 409 whose description reports unresolved issues maps to the
    /// dedicated error.
    #[tokio::test]
    async fn test_run_on_object_with_issues() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/action/10/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 10, "name": "start", "config": {"config": []},
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cluster/1/action/10/run/"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "TASK_ERROR",
                "level": "error",
                "desc": "object cluster #1 has issues",
            })))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let mut action = cluster.action(10).expect("action handle");
        let err = action.run(RunParams::new()).await.unwrap_err();
        assert!(matches!(err, Error::ActionHasIssues), "got {err:?}");
    }

    /// `config` and `config_diff` are mutually exclusive.
    #[tokio::test]
    async fn test_conflicting_config_arguments() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        let cluster = client.cluster(1).expect("handle");
        let mut action = cluster.action(10).expect("action handle");
        let err = action
            .run(
                RunParams::new()
                    .config(json!({"a": 1}))
                    .config_diff(json!({"a": 2})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Argument(_)), "got {err:?}");
    }
}

mod task_tests {
    use super::*;

    /// Polling re-fetches until the status goes terminal.
    #[tokio::test]
    async fn test_wait_reaches_success() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/task/5/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 5, "status": "running"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/task/5/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 5, "status": "success"})),
            )
            .mount(&server)
            .await;

        let mut task = client.task(5).expect("handle");
        let status = task.wait(None).await.expect("wait");
        assert_eq!(status, "success");
    }

    /// Tracing output captured into a buffer for assertion.
    #[derive(Clone)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// A failed task returns its status rather than raising, after
    /// pulling the failed jobs' logs; a log the server reports as
    /// missing is skipped without failing the collection, and the
    /// fetched content is emitted through tracing.
    #[tokio::test]
    async fn test_wait_on_failure_collects_logs() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;
        let uri = server.uri();

        let captured = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let writer = Capture(captured.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        Mock::given(method("GET"))
            .and(path("/api/v1/task/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5,
                "status": "failed",
                "action_id": 10,
                "object_id": 2,
                "object_type": "cluster",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/2/action/10/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 10, "name": "remove"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/job/"))
            .and(query_param("task_id", "5"))
            .and(query_param("status", "failed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 7,
                "task_id": 5,
                "status": "failed",
                "log_files": [
                    {"name": "ansible", "type": "stdout", "format": "txt",
                     "url": format!("{uri}/api/v1/job/7/log/1/")},
                    {"name": "ansible", "type": "stderr", "format": "txt",
                     "url": format!("{uri}/api/v1/job/7/log/2/")},
                ],
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/job/7/log/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "type": "stdout", "format": "txt", "content": "fatal: oops",
            })))
            .mount(&server)
            .await;
        // The second log does not exist on the server.
        Mock::given(method("GET"))
            .and(path("/api/v1/job/7/log/2/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "LOG_NOT_FOUND",
                "level": "error",
                "desc": "log file not found",
            })))
            .mount(&server)
            .await;

        let mut task = client.task(5).expect("handle");
        let status = task.wait(None).await.expect("wait");
        assert_eq!(status, "failed");

        let output = String::from_utf8(captured.lock().unwrap().clone()).expect("utf8 logs");
        assert!(output.contains("Action: remove"), "got: {output}");
        assert!(output.contains("fatal: oops"), "got: {output}");
        // The missing stderr log left no trace.
        assert!(!output.contains("stderr"), "got: {output}");
    }

    /// `try_wait` turns the failed terminal status into an error.
    #[tokio::test]
    async fn test_try_wait_raises_on_failure() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/task/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5,
                "status": "failed",
                "action_id": 10,
                "object_id": 2,
                "object_type": "cluster",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/2/action/10/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 10, "name": "remove"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/job/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut task = client.task(5).expect("handle");
        let err = task.try_wait(None).await.unwrap_err();
        assert!(matches!(err, Error::TaskFailed(_)), "got {err:?}");
    }

    /// A bounded wait gives up once the deadline passes; the logs of
    /// the still-running jobs are collected before the error surfaces.
    #[tokio::test]
    async fn test_wait_times_out() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/task/6/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 6,
                "status": "running",
                "action_id": 10,
                "object_id": 2,
                "object_type": "cluster",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/2/action/10/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 10, "name": "remove"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/job/"))
            .and(query_param("task_id", "6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut task = client.task(6).expect("handle");
        let err = task
            .wait(Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WaitTimeout { .. }), "got {err:?}");
    }
}

mod config_tests {
    use super::*;

    /// `config` unwraps the value document out of the current history
    /// entry.
    #[tokio::test]
    async fn test_config_reads_current_entry() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/config/current/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 40,
                "config": {"global": {"timeout": 30}},
                "attr": null,
            })))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let config = cluster.config().await.expect("config");
        assert_eq!(config, json!({"global": {"timeout": 30}}));
    }

    /// `config_set_diff` reads the current document, merges the diff
    /// client-side and writes the result as a new history entry.
    #[tokio::test]
    async fn test_config_set_diff_merges_and_writes() {
        let server = MockServer::start().await;
        let client = connect(&server, MODERN).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/1/config/current/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 40,
                "config": {"global": {"timeout": 30, "url": null}},
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cluster/1/config/history/"))
            .and(body_partial_json(json!({
                "config": {"global": {"timeout": 30, "url": "http://x"}},
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 41,
                "config": {"global": {"timeout": 30, "url": "http://x"}},
            })))
            .mount(&server)
            .await;

        let cluster = client.cluster(1).expect("handle");
        let written = cluster
            .config_set_diff(json!({"global": {"url": "http://x"}}))
            .await
            .expect("set diff");
        assert_eq!(written, json!({"global": {"timeout": 30, "url": "http://x"}}));
    }
}
