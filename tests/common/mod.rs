// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use coverage_runner::core::config::{
    ProgressConfig, ProjectConfig, RunnerConfig, RunnerSection, ServiceConfig,
};
use coverage_runner::core::models::{ExecutionJob, ExecutionStatus};
use coverage_runner::core::registry::JobRegistry;
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

/// A JUnit test source with an underscore-convention test, a nested class
/// and a parameterized test, used across the integration suite.
pub const SAMPLE_TEST_SOURCE: &str = r#"
package com.example.qa;

import org.junit.jupiter.api.DisplayName;
import org.junit.jupiter.api.Nested;
import org.junit.jupiter.api.Test;
import org.junit.jupiter.params.ParameterizedTest;
import org.junit.jupiter.params.provider.ValueSource;

class AddressServiceTest {

    @Test
    @DisplayName("Create address happy path")
    void createAddress_Ok() {
    }

    @Test
    void createAddress_InvalidRequest_ThrowsBadRequest() {
    }

    @ParameterizedTest
    @ValueSource(strings = {"NL", "DE", "FR"})
    void createAddress_CountryCodes(String code) {
    }

    @Nested
    class Validation {

        @Test
        void updateAddress_MissingStreet_Fails() {
        }
    }
}
"#;

/// Creates a fake Maven project: a build descriptor at the root and a test
/// source file under the primary source root.
pub fn setup_fake_project(package: &str, class_name: &str, source: &str) -> (TempDir, PathBuf) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let root = temp_dir.path().to_path_buf();

    fs::write(root.join("pom.xml"), "<project/>\n").expect("Failed to write build descriptor");

    let package_path = package.replace('.', "/");
    let source_dir = root.join("src/test/java").join(package_path);
    fs::create_dir_all(&source_dir).expect("Failed to create test source directory");
    fs::write(source_dir.join(format!("{}.java", class_name)), source)
        .expect("Failed to write test source");

    (temp_dir, root)
}

/// Writes a fake runner script into the project root. The configured
/// command `sh <name>` then produces the given output and exit code while
/// ignoring the appended selection argument.
pub fn write_fake_runner(root: &Path, name: &str, body: &str) {
    fs::write(root.join(name), body).expect("Failed to write fake runner script");
}

/// Writes a pre-baked report file the post-run reconciliation will pick up.
pub fn write_report(root: &Path, report_dir: &str, class_fqn: &str, xml: &str) {
    let dir = root.join(report_dir);
    fs::create_dir_all(&dir).expect("Failed to create report directory");
    fs::write(dir.join(format!("TEST-{}.xml", class_fqn)), xml)
        .expect("Failed to write report file");
}

/// A runner configuration pointing at the fake project, with the fake
/// runner script as the external command.
pub fn fake_config(runner_script: &str, methods: &[&str]) -> RunnerConfig {
    RunnerConfig {
        language: "en".to_string(),
        project: ProjectConfig {
            build_descriptor: "pom.xml".to_string(),
            subdirectory: "backend".to_string(),
            package: Some("com.example.qa".to_string()),
        },
        runner: RunnerSection {
            command: Some(format!("sh {}", runner_script)),
            report_dir: "reports".to_string(),
            source_roots: vec!["src/test/java".to_string(), "test/java".to_string()],
        },
        progress: ProgressConfig::default(),
        services: vec![ServiceConfig {
            name: "AddressService".to_string(),
            test_class: None,
            methods: methods.iter().map(|m| m.to_string()).collect(),
        }],
    }
}

/// A report file body with one `testcase` record per `(name, passed)` pair.
pub fn report_xml(class_fqn: &str, cases: &[(&str, bool)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite>\n");
    for (name, passed) in cases {
        if *passed {
            xml.push_str(&format!(
                "  <testcase name=\"{}\" classname=\"{}\" time=\"0.012\"/>\n",
                name, class_fqn
            ));
        } else {
            xml.push_str(&format!(
                "  <testcase name=\"{}\" classname=\"{}\" time=\"0.034\">\n    <failure message=\"expected &lt;200&gt; but was &lt;400&gt;\" type=\"java.lang.AssertionError\">java.lang.AssertionError: boom\n\tat com.example.qa.{}</failure>\n  </testcase>\n",
                name, class_fqn, name
            ));
        }
    }
    xml.push_str("</testsuite>\n");
    xml
}

/// Polls the registry until the job reaches a terminal state.
pub async fn wait_terminal(registry: &JobRegistry, execution_id: Uuid) -> ExecutionJob {
    for _ in 0..200 {
        let job = registry
            .snapshot(execution_id)
            .expect("job disappeared from registry");
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job did not reach a terminal state in time");
}

/// Polls the registry until `predicate` holds, or panics after ~10s.
pub async fn wait_until<F>(registry: &JobRegistry, execution_id: Uuid, predicate: F) -> ExecutionJob
where
    F: Fn(&ExecutionJob) -> bool,
{
    for _ in 0..200 {
        let job = registry
            .snapshot(execution_id)
            .expect("job disappeared from registry");
        if predicate(&job) {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached in time");
}

/// Asserts the invariant that a terminal status implies a stamped
/// completion time.
pub fn assert_terminal_consistency(job: &ExecutionJob) {
    if job.status.is_terminal() {
        assert!(
            job.completed_at.is_some(),
            "terminal status {} without completed_at",
            job.status
        );
    }
}

/// A status assertion helper shared by the orchestrator tests.
pub fn assert_status(job: &ExecutionJob, expected: ExecutionStatus) {
    assert_eq!(
        job.status, expected,
        "unexpected status (error: {:?})",
        job.error_message
    );
}
