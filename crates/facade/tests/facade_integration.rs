//! End-to-end behaviour of the facade against scripted backends.
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use simulator_core::{
    BaselineConfiguration, CreateSnapshotCommand, MinimalSimulatorConfiguration, RunRequest,
    SimulatorId, SimulatorResponse,
};
use simulator_facade::embedded::mock::{EmbeddedCall, MockRuntimeSource};
use simulator_facade::transport::mock::{MockFetch, MockReply};
use simulator_facade::{
    Backend, FacadeError, InitializationError, Method, Operation, RoutingTable, SimulatorFacade,
    TransportError, UnitOfWork,
};

const BASE_URL: &str = "http://sim.test";

fn baseline() -> BaselineConfiguration {
    BaselineConfiguration {
        tier: "Legendary".into(),
        jobtype: "archmagetc".into(),
        job_category: 1,
        level: 270,
        artifact_level: 40,
        passive_skill_level: 0,
        combat_orders_level: 1,
    }
}

fn minimal() -> MinimalSimulatorConfiguration {
    serde_json::from_value(json!({
        "action_stat": {},
        "groups": [],
        "injected_values": {},
        "skill_levels": {},
        "v_improvements": {},
        "character_stat": {},
    }))
    .unwrap()
}

fn facade(fetch: &Arc<MockFetch>, source: &MockRuntimeSource) -> SimulatorFacade {
    SimulatorFacade::builder()
        .base_url(BASE_URL)
        .fetch(fetch.clone())
        .runtime_source(Arc::new(source.clone()))
        .build()
        .expect("facade should build")
}

fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

#[tokio::test]
async fn embedded_operations_initialize_once() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new();
    let facade = facade(&fetch, &source);

    let created = facade.create_baseline_simulator(&baseline()).await.unwrap();
    facade
        .run(&created.id, &RunRequest::new("ELAPSE 10.0"))
        .await
        .unwrap();
    facade.initialize().await.unwrap();

    assert_eq!(source.acquisitions(), 1);
    assert_eq!(source.units_of_work(), 1);
    assert_eq!(fetch.call_count(), 0);
}

#[tokio::test]
async fn concurrent_embedded_operations_share_initialization() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new().with_acquire_delay(Duration::from_millis(50));
    let facade = facade(&fetch, &source);
    let request = RunRequest::new("ELAPSE 10.0");
    let id = SimulatorId::from("sim-1");
    let baseline = baseline();

    let (created, ran) = tokio::join!(
        facade.create_baseline_simulator(&baseline),
        facade.run(&id, &request)
    );

    assert!(created.is_ok());
    assert!(ran.is_ok());
    assert_eq!(source.acquisitions(), 1);

    // Both calls must have used the one shared unit of work.
    let uows: Vec<UnitOfWork> = source
        .calls()
        .into_iter()
        .map(|call| match call {
            EmbeddedCall::CreateSimulator { uow, .. } | EmbeddedCall::RunSimulator { uow, .. } => {
                uow
            }
        })
        .collect();
    assert_eq!(uows.len(), 2);
    assert_eq!(uows[0], uows[1]);
}

#[tokio::test]
async fn list_simulators_reports_active_identity() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new().with_next_simulator_id(42);
    let facade = facade(&fetch, &source);

    assert_eq!(facade.list_simulators().await.unwrap(), vec![]);

    let created = facade.create_baseline_simulator(&baseline()).await.unwrap();
    assert_eq!(created, SimulatorResponse::new(42));
    assert_eq!(
        facade.list_simulators().await.unwrap(),
        vec![SimulatorResponse::new(42)]
    );

    // Superseded by the next creation, never accumulated.
    facade.create_baseline_simulator(&baseline()).await.unwrap();
    assert_eq!(
        facade.list_simulators().await.unwrap(),
        vec![SimulatorResponse::new(43)]
    );
    assert_eq!(fetch.call_count(), 0);
}

#[tokio::test]
async fn list_simulators_before_creation_does_not_initialize() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new();
    let facade = facade(&fetch, &source);

    assert!(facade.list_simulators().await.unwrap().is_empty());
    assert_eq!(source.acquisitions(), 0);
    assert_eq!(fetch.call_count(), 0);
}

#[tokio::test]
async fn run_uses_caller_supplied_identity_and_plan() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new().with_next_simulator_id(7);
    let facade = facade(&fetch, &source);
    facade.create_baseline_simulator(&baseline()).await.unwrap();

    let logs = facade
        .run(&SimulatorId::from("sim-1"), &RunRequest::new("P"))
        .await
        .unwrap();

    let last_call = source.calls().pop().unwrap();
    assert_eq!(
        last_call,
        EmbeddedCall::RunSimulator {
            id: SimulatorId::from("sim-1"),
            plan: "P".into(),
            uow: UnitOfWork::new(1),
        }
    );
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].command.as_deref(), Some("P"));
}

#[tokio::test]
async fn get_logs_reruns_empty_plan_on_active_identity() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new().with_next_simulator_id(7);
    let facade = facade(&fetch, &source);
    facade.create_baseline_simulator(&baseline()).await.unwrap();

    let logs = facade.get_logs(&SimulatorId::from("anything")).await.unwrap();

    assert_eq!(
        source.calls().pop().unwrap(),
        EmbeddedCall::RunSimulator {
            id: SimulatorId::Int(7),
            plan: String::new(),
            uow: UnitOfWork::new(1),
        }
    );
    assert_eq!(logs.len(), 1);
    assert_eq!(fetch.call_count(), 0);
}

#[tokio::test]
async fn get_logs_without_active_identity_is_invalid_state() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new();
    let facade = facade(&fetch, &source);

    let err = facade.get_logs(&SimulatorId::Int(1)).await.unwrap_err();

    assert!(matches!(
        err,
        FacadeError::InvalidState {
            operation: Operation::GetLogs
        }
    ));
    assert_eq!(source.acquisitions(), 0);
}

#[tokio::test]
async fn remote_failure_is_transport_error_without_retry() {
    let fetch = Arc::new(MockFetch::failing("connection reset"));
    let source = MockRuntimeSource::new();
    let facade = facade(&fetch, &source);

    let skills = facade.list_skills().await.unwrap_err();
    assert!(matches!(
        skills,
        FacadeError::Transport(TransportError::Network { .. })
    ));
    assert_eq!(fetch.call_count(), 1);

    let snapshots = facade.list_snapshots().await.unwrap_err();
    assert!(matches!(snapshots, FacadeError::Transport(_)));
    assert_eq!(fetch.call_count(), 2);

    let latest = facade.get_latest_log(&SimulatorId::Int(1)).await.unwrap_err();
    assert!(matches!(latest, FacadeError::Transport(_)));
    assert_eq!(fetch.call_count(), 3);

    let created = facade.create_minimal_simulator(&minimal()).await.unwrap_err();
    assert!(matches!(created, FacadeError::Transport(_)));
    assert_eq!(fetch.call_count(), 4);

    let snapshot = facade
        .create_snapshot(&CreateSnapshotCommand {
            name: "boss".into(),
            simulator_id: SimulatorId::Int(1),
        })
        .await
        .unwrap_err();
    assert!(matches!(snapshot, FacadeError::Transport(_)));
    assert_eq!(fetch.call_count(), 5);

    let loaded = facade.load_snapshot("snap-1").await.unwrap_err();
    assert!(matches!(loaded, FacadeError::Transport(_)));
    assert_eq!(fetch.call_count(), 6);
    assert_eq!(source.acquisitions(), 0);
}

#[tokio::test]
async fn rerouted_remote_failure_is_transport_error() {
    let fetch = Arc::new(MockFetch::failing("connection refused"));
    let source = MockRuntimeSource::new();
    let facade = SimulatorFacade::builder()
        .base_url(BASE_URL)
        .routes(RoutingTable::remote_only())
        .fetch(fetch.clone())
        .runtime_source(Arc::new(source.clone()))
        .build()
        .unwrap();
    let id = SimulatorId::Int(1);

    assert!(matches!(
        facade.list_simulators().await,
        Err(FacadeError::Transport(_))
    ));
    assert!(matches!(
        facade.create_baseline_simulator(&baseline()).await,
        Err(FacadeError::Transport(_))
    ));
    assert!(matches!(
        facade.run(&id, &RunRequest::new("ELAPSE 1.0")).await,
        Err(FacadeError::Transport(_))
    ));
    assert!(matches!(
        facade.get_logs(&id).await,
        Err(FacadeError::Transport(_))
    ));

    assert_eq!(fetch.call_count(), 4);
    assert_eq!(source.acquisitions(), 0);
}

#[tokio::test]
async fn failed_initialization_is_retried_by_next_call() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new().fail_acquisitions(1);
    let facade = facade(&fetch, &source);

    let err = facade
        .create_baseline_simulator(&baseline())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FacadeError::Initialization(InitializationError::Acquire(_))
    ));
    assert_eq!(facade.active_simulator().await, None);

    facade.create_baseline_simulator(&baseline()).await.unwrap();
    assert_eq!(source.acquisitions(), 2);
    assert!(facade.active_simulator().await.is_some());
}

#[tokio::test]
async fn failed_package_install_stores_no_identity() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new().fail_package("lark");
    let facade = facade(&fetch, &source);

    let err = facade
        .create_baseline_simulator(&baseline())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FacadeError::Initialization(InitializationError::PackageInstall { ref package, .. })
            if package == "lark"
    ));
    assert!(facade.list_simulators().await.unwrap().is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn remote_operations_hit_documented_endpoints() {
    let fetch = Arc::new(
        MockFetch::new()
            .reply(Method::Get, &url("/skills"), MockReply::json(json!([{"id": "chain_lightning", "name": "Chain Lightning"}])))
            .reply(Method::Get, &url("/snapshots"), MockReply::json(json!([])))
            .reply(
                Method::Post,
                &url("/snapshots"),
                MockReply::json(json!({"id": "snap-1", "name": "boss", "simulator_id": "ws-1"})),
            )
            .reply(Method::Post, &url("/snapshots/snap-1/load"), MockReply::json(json!("ws-2")))
            .reply(
                Method::Get,
                &url("/workspaces/logs/ws-1/latest"),
                MockReply::json(json!({"index": 4, "clock": 120.0})),
            )
            .reply(
                Method::Post,
                &url("/workspaces"),
                MockReply::json(json!({"id": "ws-1"})),
            ),
    );
    let source = MockRuntimeSource::new();
    let facade = facade(&fetch, &source);

    let skills = facade.list_skills().await.unwrap();
    assert_eq!(skills[0].id, "chain_lightning");

    assert!(facade.list_snapshots().await.unwrap().is_empty());

    let snapshot = facade
        .create_snapshot(&CreateSnapshotCommand {
            name: "boss".into(),
            simulator_id: SimulatorId::from("ws-1"),
        })
        .await
        .unwrap();
    assert_eq!(snapshot.id, "snap-1");

    assert_eq!(facade.load_snapshot("snap-1").await.unwrap(), "ws-2");

    let latest = facade
        .get_latest_log(&SimulatorId::from("ws-1"))
        .await
        .unwrap();
    assert_eq!(latest.index, 4);

    let created = facade
        .create_minimal_simulator(&minimal())
        .await
        .unwrap();
    assert_eq!(created.id, SimulatorId::from("ws-1"));

    let requests = fetch.requests();
    assert_eq!(requests.len(), 6);
    assert!(requests
        .iter()
        .all(|r| r.header("content-type") == Some("application/json")));
    assert_eq!(requests[2].body.as_deref().map(|b| b.contains("\"boss\"")), Some(true));
    assert_eq!(requests[3].body, None);
    assert_eq!(source.acquisitions(), 0);
}

#[tokio::test]
async fn rerouted_operations_use_remote_endpoints() {
    let fetch = Arc::new(
        MockFetch::new()
            .reply(Method::Get, &url("/workspaces"), MockReply::json(json!([{"id": "ws-9"}])))
            .reply(
                Method::Get,
                &url("/workspaces/logs/ws-9"),
                MockReply::json(json!([{"index": 0}, {"index": 1}])),
            )
            .reply(
                Method::Post,
                &url("/workspaces/run/ws-9"),
                MockReply::json(json!([{"index": 0}])),
            )
            .reply(
                Method::Post,
                &url("/workspaces/baseline"),
                MockReply::json(json!({"id": "ws-9"})),
            ),
    );
    let source = MockRuntimeSource::new();
    let facade = SimulatorFacade::builder()
        .base_url(BASE_URL)
        .routes(RoutingTable::remote_only())
        .fetch(fetch.clone())
        .runtime_source(Arc::new(source.clone()))
        .build()
        .unwrap();
    let id = SimulatorId::from("ws-9");

    let created = facade.create_baseline_simulator(&baseline()).await.unwrap();
    assert_eq!(created.id, id);
    assert_eq!(facade.active_simulator().await, None);

    assert_eq!(facade.list_simulators().await.unwrap(), vec![SimulatorResponse::new("ws-9")]);
    assert_eq!(facade.get_logs(&id).await.unwrap().len(), 2);
    assert_eq!(facade.run(&id, &RunRequest::new("ELAPSE 1.0")).await.unwrap().len(), 1);

    let run_request = fetch.requests().pop().unwrap();
    assert_eq!(run_request.body.as_deref(), Some(r#"{"plan":"ELAPSE 1.0"}"#));
    assert_eq!(source.acquisitions(), 0);
}

#[tokio::test]
async fn unsupported_route_is_reported() {
    let fetch = Arc::new(MockFetch::new());
    let source = MockRuntimeSource::new();
    let facade = SimulatorFacade::builder()
        .base_url(BASE_URL)
        .routes(RoutingTable::default().route(Operation::ListSkills, Backend::Embedded))
        .fetch(fetch.clone())
        .runtime_source(Arc::new(source.clone()))
        .build()
        .unwrap();

    let err = facade.list_skills().await.unwrap_err();

    assert!(matches!(
        err,
        FacadeError::UnsupportedRoute {
            operation: Operation::ListSkills,
            backend: Backend::Embedded
        }
    ));
    assert_eq!(fetch.call_count(), 0);
    assert_eq!(source.acquisitions(), 0);
}

#[tokio::test]
async fn facades_do_not_share_sessions() {
    let fetch = Arc::new(MockFetch::new());
    let first_source = MockRuntimeSource::new();
    let second_source = MockRuntimeSource::new();
    let first = facade(&fetch, &first_source);
    let second = facade(&fetch, &second_source);

    first.create_baseline_simulator(&baseline()).await.unwrap();

    assert!(second.list_simulators().await.unwrap().is_empty());
    assert_eq!(second_source.acquisitions(), 0);
}
