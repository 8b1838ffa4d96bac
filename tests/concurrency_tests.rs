//! # Concurrency Tests / 并发测试
//!
//! This module exercises the registry's single-writer discipline: one
//! writer mutates a job while many pollers take snapshots. Pollers must
//! never observe a terminal status without a completion timestamp, a
//! shrinking result list, or a decreasing confirmed count.
//!
//! 此模块检验注册表的单写者纪律：一个写者修改任务，
//! 多个轮询者并发获取快照。轮询者绝不能观察到没有完成时间戳的终态、
//! 收缩的结果列表或递减的已确认计数。

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use coverage_runner::core::models::{
        ExecutionJob, ExecutionScope, ExecutionStatus, TestCaseResult, TestCaseStatus,
    };
    use coverage_runner::core::registry::JobRegistry;
    use std::sync::Arc;
    use std::thread;

    const RESULTS: usize = 200;
    const POLLERS: usize = 4;

    fn case(i: usize) -> TestCaseResult {
        TestCaseResult {
            test_name: format!("case_{}", i),
            class_name: "com.example.qa.AddressServiceTest".to_string(),
            status: TestCaseStatus::Passed,
            duration_secs: 0.001,
            message: None,
            stack_excerpt: None,
        }
    }

    /// One writer appends results and finally flips the job terminal while
    /// pollers continuously snapshot. Every snapshot must satisfy the
    /// ordering guarantees the polling boundary promises.
    #[test]
    fn test_single_writer_many_pollers() {
        let registry = Arc::new(JobRegistry::new());
        let id = registry.create(ExecutionJob::new(
            ExecutionScope::Service {
                service: "AddressService".to_string(),
            },
            RESULTS,
        ));
        registry.update(id, |job| job.status = ExecutionStatus::Running);

        let mut handles = Vec::new();
        for _ in 0..POLLERS {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let mut last_len = 0usize;
                let mut last_confirmed = 0usize;
                loop {
                    let job = registry.snapshot(id).expect("job must stay registered");

                    assert!(
                        job.results.len() >= last_len,
                        "result list shrank from {} to {}",
                        last_len,
                        job.results.len()
                    );
                    assert!(
                        job.confirmed_completed >= last_confirmed,
                        "confirmed count decreased from {} to {}",
                        last_confirmed,
                        job.confirmed_completed
                    );
                    if job.status.is_terminal() {
                        assert!(
                            job.completed_at.is_some(),
                            "terminal status visible before completed_at"
                        );
                        return job.results.len();
                    }

                    last_len = job.results.len();
                    last_confirmed = job.confirmed_completed;
                }
            }));
        }

        // The single writer: incremental appends, then one terminal flip.
        for i in 0..RESULTS {
            registry.update(id, |job| {
                job.add_result(case(i));
                job.confirmed_completed += 1;
            });
        }
        registry.update(id, |job| {
            job.recompute_counts();
            job.status = ExecutionStatus::Completed;
            job.completed_at = Some(Utc::now());
        });

        for handle in handles {
            let observed = handle.join().expect("poller panicked");
            assert_eq!(observed, RESULTS);
        }
    }

    /// Concurrent snapshots of independent jobs do not interfere; each job
    /// has exactly one writer and jobs share no mutable state.
    #[test]
    fn test_independent_jobs_do_not_interfere() {
        let registry = Arc::new(JobRegistry::new());
        let ids: Vec<_> = (0..8)
            .map(|_| registry.create(ExecutionJob::new(ExecutionScope::All, 10)))
            .collect();

        let mut handles = Vec::new();
        for (n, id) in ids.iter().copied().enumerate() {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    registry.update(id, |job| {
                        job.add_result(case(n * 1000 + i));
                        job.confirmed_completed += 1;
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().expect("writer panicked");
        }

        for id in ids {
            let job = registry.snapshot(id).unwrap();
            assert_eq!(job.results.len(), 50);
            assert_eq!(job.confirmed_completed, 50);
        }
    }
}
