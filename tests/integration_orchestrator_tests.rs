//! # Orchestrator Integration Tests / 编排器集成测试
//!
//! End-to-end tests of the execution orchestrator against a fake runner
//! command and pre-baked report files: submission validation, streamed
//! counter updates, report reconciliation, terminal transitions,
//! cancellation and result persistence.
//!
//! 针对伪造运行器命令和预置报告文件的编排器端到端测试：
//! 提交校验、流式计数更新、报告对账、终态转换、取消和结果持久化。

mod common;

use common::*;
use coverage_runner::core::error::ApiError;
use coverage_runner::core::models::{
    ExecutionRequest, ExecutionScope, ExecutionStatus, TestCaseStatus,
};
use coverage_runner::core::orchestrator::ExecutionOrchestrator;
use coverage_runner::core::registry::JobRegistry;
use coverage_runner::core::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

const CLASS_FQN: &str = "com.example.qa.AddressServiceTest";

fn orchestrator_for(
    root: std::path::PathBuf,
    config: coverage_runner::core::config::RunnerConfig,
) -> (ExecutionOrchestrator, Arc<JobRegistry>, Arc<MemoryStore>) {
    let registry = Arc::new(JobRegistry::new());
    let store = Arc::new(MemoryStore::new());
    let orchestrator = ExecutionOrchestrator::new(
        config,
        root,
        Arc::clone(&registry),
        Arc::clone(&store) as Arc<dyn coverage_runner::core::store::ResultStore>,
    );
    (orchestrator, registry, store)
}

fn request_for_tests(tests: &[&str]) -> ExecutionRequest {
    ExecutionRequest {
        service: Some("AddressService".to_string()),
        tests: tests.iter().map(|t| t.to_string()).collect(),
        client_id: Some("tenant-1".to_string()),
        triggered_by_name: Some("qa-bot".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_completed_run_persists_results() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    write_fake_runner(
        &root,
        "fake_runner.sh",
        "echo \"Running com.example.qa.AddressServiceTest\"\necho \"Tests run: 2, Failures: 0, Errors: 0, Skipped: 0\"\nexit 0\n",
    );
    write_report(
        &root,
        "reports",
        CLASS_FQN,
        &report_xml(
            CLASS_FQN,
            &[
                ("createAddress_Ok", true),
                ("createAddress_InvalidRequest_ThrowsBadRequest", true),
            ],
        ),
    );
    // A stale report from another service's earlier run must stay out of a
    // scoped reconciliation.
    write_report(
        &root,
        "reports",
        "com.example.qa.OrderServiceTest",
        &report_xml("com.example.qa.OrderServiceTest", &[("placeOrder_Ok", true)]),
    );

    let (orchestrator, registry, store) =
        orchestrator_for(root, fake_config("fake_runner.sh", &["createAddress"]));

    let submitted = orchestrator
        .submit(request_for_tests(&[
            "createAddress_Ok",
            "createAddress_InvalidRequest_ThrowsBadRequest",
        ]))
        .await
        .unwrap();
    assert_eq!(submitted.expected_total, 2);
    assert!(matches!(
        submitted.status,
        ExecutionStatus::Pending | ExecutionStatus::Running
    ));

    let job = wait_terminal(&registry, submitted.execution_id).await;
    assert_status(&job, ExecutionStatus::Completed);
    assert_terminal_consistency(&job);
    assert_eq!(job.results.len(), 2);
    assert_eq!(job.passed, 2);
    assert_eq!(job.failed, 0);
    assert!(job.error_message.is_none());

    // Persistence: one aggregate, two rows, two latest upserts.
    let runs = store.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_type, "SELECTION");
    assert_eq!(runs[0].client_id.as_deref(), Some("tenant-1"));
    assert_eq!(runs[0].triggered_by_name.as_deref(), Some("qa-bot"));
    assert_eq!(runs[0].total, 2);
    assert_eq!(runs[0].status, ExecutionStatus::Completed);

    let rows = store.results_for_run(runs[0].id);
    assert_eq!(rows.len(), 2);
    let ok_row = rows
        .iter()
        .find(|r| r.test_method == "createAddress_Ok")
        .unwrap();
    assert_eq!(ok_row.display_name.as_deref(), Some("Create address happy path"));
    assert_eq!(ok_row.service.as_deref(), Some("AddressService"));

    let latest = store
        .latest_for("tenant-1", "AddressService", CLASS_FQN, "createAddress_Ok")
        .unwrap();
    assert_eq!(latest.status, TestCaseStatus::Passed);
    assert_eq!(store.latest_results().len(), 2);
}

/// The mid-run scenario: expected total 10, one streamed summary line, then
/// reports confirming all 10 records and a nonzero exit.
#[tokio::test]
async fn test_streamed_counts_then_reconciliation() {
    let mut source = String::from("class AddressServiceTest {\n");
    for i in 1..=10 {
        source.push_str(&format!("    @Test\n    void createAddress_Case{}() {{\n    }}\n", i));
    }
    source.push_str("}\n");

    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", &source);
    write_fake_runner(
        &root,
        "fake_runner.sh",
        "echo \"Running com.example.qa.AddressServiceTest\"\necho \"Tests run: 4, Failures: 1, Errors: 0, Skipped: 0\"\nsleep 2\nexit 1\n",
    );
    let cases: Vec<(String, bool)> = (1..=10)
        .map(|i| (format!("createAddress_Case{}", i), i != 3))
        .collect();
    let case_refs: Vec<(&str, bool)> = cases.iter().map(|(n, p)| (n.as_str(), *p)).collect();
    write_report(&root, "reports", CLASS_FQN, &report_xml(CLASS_FQN, &case_refs));

    let (orchestrator, registry, _store) =
        orchestrator_for(root, fake_config("fake_runner.sh", &["createAddress"]));

    let submitted = orchestrator
        .submit(ExecutionRequest {
            service: Some("AddressService".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(submitted.expected_total, 10);

    // Mid-run: the streamed per-class roll-up is already visible while the
    // runner is still sleeping.
    let mid = wait_until(&registry, submitted.execution_id, |job| {
        job.confirmed_completed >= 4
    })
    .await;
    assert_eq!(mid.passed, 3);
    assert_eq!(mid.failed, 1);
    assert_eq!(mid.skipped, 0);

    // Post-run: reconciliation supersedes the streamed counts.
    let job = wait_terminal(&registry, submitted.execution_id).await;
    assert_status(&job, ExecutionStatus::CompletedWithFailures);
    assert_eq!(job.results.len(), 10);
    assert_eq!(job.confirmed_completed, 10);
    assert_eq!(job.passed, 9);
    assert_eq!(job.failed, 1);
    assert_terminal_consistency(&job);
}

#[tokio::test]
async fn test_method_resolution_expands_parameterized() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    write_fake_runner(&root, "fake_runner.sh", "exit 0\n");
    write_report(
        &root,
        "reports",
        CLASS_FQN,
        &report_xml(
            CLASS_FQN,
            &[
                ("createAddress_Ok", true),
                ("createAddress_InvalidRequest_ThrowsBadRequest", true),
                ("createAddress_CountryCodes(String)[1]", true),
                ("createAddress_CountryCodes(String)[2]", true),
                ("createAddress_CountryCodes(String)[3]", true),
            ],
        ),
    );

    let (orchestrator, registry, store) =
        orchestrator_for(root, fake_config("fake_runner.sh", &["createAddress"]));

    let submitted = orchestrator
        .submit(ExecutionRequest {
            service: Some("AddressService".to_string()),
            method: Some("createAddress".to_string()),
            client_id: Some("tenant-1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Three parameterized invocations plus two plain tests.
    assert_eq!(submitted.expected_total, 5);
    match &submitted.scope {
        ExecutionScope::Tests { service, tests } => {
            assert_eq!(service, "AddressService");
            assert_eq!(tests.len(), 5);
        }
        other => panic!("expected Tests scope, got {:?}", other),
    }

    let job = wait_terminal(&registry, submitted.execution_id).await;
    assert_status(&job, ExecutionStatus::Completed);
    assert_eq!(job.results.len(), 5);

    let runs = store.runs();
    let rows = store.results_for_run(runs[0].id);
    assert!(rows
        .iter()
        .all(|r| r.production_method.as_deref() == Some("createAddress")));
}

#[tokio::test]
async fn test_unspawnable_command_fails_job() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    let mut config = fake_config("fake_runner.sh", &["createAddress"]);
    config.runner.command = Some("definitely-not-a-real-binary-xyz-123".to_string());

    let (orchestrator, registry, store) = orchestrator_for(root, config);

    let submitted = orchestrator
        .submit(request_for_tests(&["createAddress_Ok"]))
        .await
        .unwrap();

    let job = wait_terminal(&registry, submitted.execution_id).await;
    assert_status(&job, ExecutionStatus::Failed);
    assert!(job
        .error_message
        .as_deref()
        .unwrap()
        .contains("Failed to launch test runner"));
    assert_terminal_consistency(&job);
    // Orchestration failures persist nothing.
    assert!(store.runs().is_empty());
}

#[tokio::test]
async fn test_nonzero_exit_with_no_results_is_failed() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    write_fake_runner(&root, "fake_runner.sh", "echo \"nothing useful\"\nexit 3\n");

    let (orchestrator, registry, _store) =
        orchestrator_for(root, fake_config("fake_runner.sh", &["createAddress"]));

    let submitted = orchestrator
        .submit(request_for_tests(&["createAddress_Ok"]))
        .await
        .unwrap();

    let job = wait_terminal(&registry, submitted.execution_id).await;
    assert_status(&job, ExecutionStatus::Failed);
    let message = job.error_message.as_deref().unwrap();
    assert!(message.contains("exited with status 3"));
    assert!(message.contains("no results were captured"));
}

#[tokio::test]
async fn test_submission_validation() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    let (orchestrator, _registry, _store) =
        orchestrator_for(root, fake_config("fake_runner.sh", &["createAddress"]));

    // Entirely empty request.
    let err = orchestrator
        .submit(ExecutionRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    // Unknown service.
    let err = orchestrator
        .submit(ExecutionRequest {
            service: Some("PaymentService".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    // A method with no matching tests is rejected before any subprocess.
    let err = orchestrator
        .submit(ExecutionRequest {
            service: Some("AddressService".to_string()),
            method: Some("deleteAddress".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    match err {
        ApiError::BadRequest(message) => assert!(message.contains("no tests found for method")),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

/// Upserting the same `(client, service, class, method)` key twice keeps
/// exactly one record carrying the second run's values.
#[tokio::test]
async fn test_latest_result_upsert_is_idempotent_per_key() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    write_fake_runner(&root, "fake_runner.sh", "exit 0\n");
    write_report(
        &root,
        "reports",
        CLASS_FQN,
        &report_xml(CLASS_FQN, &[("createAddress_Ok", true)]),
    );

    let (orchestrator, registry, store) =
        orchestrator_for(root.clone(), fake_config("fake_runner.sh", &["createAddress"]));

    let first = orchestrator
        .submit(request_for_tests(&["createAddress_Ok"]))
        .await
        .unwrap();
    wait_terminal(&registry, first.execution_id).await;

    // Second run: same key, now failing.
    write_fake_runner(&root, "fake_runner.sh", "exit 1\n");
    write_report(
        &root,
        "reports",
        CLASS_FQN,
        &report_xml(CLASS_FQN, &[("createAddress_Ok", false)]),
    );
    let second = orchestrator
        .submit(request_for_tests(&["createAddress_Ok"]))
        .await
        .unwrap();
    wait_terminal(&registry, second.execution_id).await;

    assert_eq!(store.runs().len(), 2);
    assert_eq!(store.latest_results().len(), 1);
    let latest = store
        .latest_for("tenant-1", "AddressService", CLASS_FQN, "createAddress_Ok")
        .unwrap();
    assert_eq!(latest.status, TestCaseStatus::Failed);
    assert!(latest.error_message.is_some());
}

#[tokio::test]
async fn test_cancel_mid_run() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    write_fake_runner(&root, "fake_runner.sh", "sleep 30\nexit 0\n");

    let (orchestrator, registry, store) =
        orchestrator_for(root, fake_config("fake_runner.sh", &["createAddress"]));

    let submitted = orchestrator
        .submit(request_for_tests(&["createAddress_Ok"]))
        .await
        .unwrap();

    // Give the worker time to spawn and register the process handle.
    tokio::time::sleep(Duration::from_millis(500)).await;
    registry.cancel(submitted.execution_id).await.unwrap();

    let job = wait_terminal(&registry, submitted.execution_id).await;
    assert_status(&job, ExecutionStatus::Failed);
    assert!(job.error_message.as_deref().unwrap().contains("cancelled"));
    assert_terminal_consistency(&job);

    // The worker must not resurrect or overwrite the cancelled state.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let settled = registry.snapshot(submitted.execution_id).unwrap();
    assert_eq!(settled.status, ExecutionStatus::Failed);
    assert!(settled.error_message.as_deref().unwrap().contains("cancelled"));
    assert!(store.runs().is_empty());
}

/// Expected totals for a service-scoped run come from the coverage map:
/// the underscore tests plus the expanded parameterized invocations.
#[tokio::test]
async fn test_service_scope_expected_total_from_coverage() {
    let (_guard, root) = setup_fake_project("com.example.qa", "AddressServiceTest", SAMPLE_TEST_SOURCE);
    write_fake_runner(&root, "fake_runner.sh", "exit 0\n");

    let (orchestrator, registry, _store) = orchestrator_for(
        root,
        fake_config("fake_runner.sh", &["createAddress", "updateAddress"]),
    );

    let submitted = orchestrator
        .submit(ExecutionRequest {
            service: Some("AddressService".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    // createAddress: 2 plain + 3 parameterized; updateAddress: 1 nested.
    assert_eq!(submitted.expected_total, 6);
    wait_terminal(&registry, submitted.execution_id).await;
}
