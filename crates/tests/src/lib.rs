//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 → 投递策略的连通性
//! - 模拟 e2e 测试 (数据源 → 批次 → 扇出 → 外部程序)
//! - 调度器与扇出在虚拟时间下的协作

#[cfg(test)]
mod contract_tests {
    use std::time::Duration;

    use contracts::DeliveryPolicy;
    use dispatcher::ConfiguredSink;

    #[test]
    fn test_config_policy_reaches_sink() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
[delivery]
max_attempts = 5
interrupt_after_secs = 30
kill_after_secs = 45

[[jobs]]
name = "mining"
period_secs = 600
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(
            blueprint.delivery,
            DeliveryPolicy::new(5, Duration::from_secs(30), Duration::from_secs(45))
        );

        let sink = ConfiguredSink::new(false, blueprint.delivery);
        match sink {
            ConfiguredSink::Subprocess(ref inner) => {
                assert_eq!(*inner.policy(), blueprint.delivery)
            }
            ConfiguredSink::Log(_) => panic!("expected subprocess sink"),
        }
        assert!(ConfiguredSink::new(true, blueprint.delivery).metrics().is_none());
    }
}

#[cfg(all(test, unix))]
mod e2e_tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use collector::{SheetSet, StaticSource, collect_batch};
    use contracts::{DeliveryPolicy, DeliveryTarget};
    use dispatcher::{DispatcherError, FanOut, SubprocessSink};

    /// 写入 `<dir>/<worksheet>`，对 `$2 == fail_on` 返回失败
    fn writer_script(dir: &Path, fail_on: &str) -> PathBuf {
        let path = dir.join("deliver.sh");
        let body = format!(
            "#!/bin/sh\nif [ \"$2\" = \"{fail_on}\" ]; then echo 'sheet locked' >&2; exit 1; fi\ncat > {out}/\"$2\"\n",
            out = dir.display()
        );
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn profile_source() -> StaticSource {
        StaticSource::new()
            .with_series("conf", "fee,conf\n1,0.5\n")
            .with_series("txrate", "fee,rate\n1,3.2\n")
    }

    fn profile_set() -> SheetSet {
        SheetSet::prefixed("profile", &["conf", "txrate"]).with_timestamp("profile_time")
    }

    fn fanout(program: PathBuf, policy: DeliveryPolicy) -> FanOut<SubprocessSink> {
        FanOut::new(
            Arc::new(SubprocessSink::new("gspread", policy)),
            Arc::new(DeliveryTarget::new(program, "sheet-id", "/etc/auth.json")),
        )
    }

    /// End-to-end: StaticSource -> collect_batch -> FanOut -> external program
    #[tokio::test]
    async fn test_e2e_batch_reaches_program() {
        let dir = tempfile::tempdir().unwrap();
        let program = writer_script(dir.path(), "none");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();

        let payloads = collect_batch(&profile_source(), &profile_set(), now)
            .await
            .unwrap();
        assert_eq!(payloads.len(), 3);

        let fanout = fanout(
            program,
            DeliveryPolicy::new(2, Duration::from_secs(10), Duration::from_secs(20)),
        );
        fanout.deliver_all(payloads).await.unwrap();

        let read = |sheet: &str| std::fs::read_to_string(dir.path().join(sheet)).unwrap();
        assert_eq!(read("profile_conf"), "fee,conf\n1,0.5\n");
        assert_eq!(read("profile_txrate"), "fee,rate\n1,3.2\n");
        assert_eq!(read("profile_time"), "timestr\n01 May 24 08:30 UTC\n");

        let snapshot = fanout.sink().metrics().snapshot();
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.successes, 3);
    }

    /// 单个工作表失败不影响其它工作表
    #[tokio::test]
    async fn test_e2e_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = writer_script(dir.path(), "profile_txrate");

        let payloads = collect_batch(&profile_source(), &profile_set(), Utc::now())
            .await
            .unwrap();
        let fanout = fanout(
            program,
            DeliveryPolicy::new(2, Duration::from_secs(10), Duration::from_secs(20)),
        );

        let err = fanout.deliver_all(payloads).await.unwrap_err();
        match err {
            DispatcherError::PartialBatch {
                failed,
                total,
                ref label,
                ref diagnostic,
            } => {
                assert_eq!((failed, total), (1, 3));
                assert_eq!(label, "profile_txrate");
                assert!(diagnostic.contains("sheet locked"), "got: {diagnostic}");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(dir.path().join("profile_conf").exists());
        assert!(dir.path().join("profile_time").exists());
        assert!(!dir.path().join("profile_txrate").exists());

        let snapshot = fanout.sink().metrics().snapshot();
        assert_eq!(snapshot.attempts, 4);
        assert_eq!(snapshot.exhausted, 1);
    }
}

#[cfg(test)]
mod scheduling_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use collector::{SheetSet, StaticSource, collect_batch};
    use contracts::{DeliveryOutcome, DeliverySink, DeliveryTarget, JobSpec, Payload};
    use dispatcher::FanOut;
    use observability::{LogLevel, MemoryLogger};
    use scheduler::{FixedClock, PeriodicScheduler, ScheduledJob, task};

    #[derive(Default)]
    struct CountingSink {
        delivered: AtomicU64,
    }

    impl DeliverySink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        async fn deliver(&self, _payload: &Payload, _target: &DeliveryTarget) -> DeliveryOutcome {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            DeliveryOutcome::delivered(1)
        }
    }

    fn mining_job(
        source: Arc<StaticSource>,
        fanout: FanOut<CountingSink>,
        clock: Arc<FixedClock>,
    ) -> ScheduledJob {
        let set = Arc::new(
            SheetSet::prefixed("mining", &["mfr", "mbs"]).with_timestamp("mining_time"),
        );
        ScheduledJob::new(
            JobSpec::new("mining", Duration::from_secs(60), Duration::ZERO),
            task(move || {
                let set = Arc::clone(&set);
                let source = Arc::clone(&source);
                let fanout = fanout.clone();
                let now = clock.0;
                async move {
                    let payloads = collect_batch(&*source, &set, now).await?;
                    fanout.deliver_all(payloads).await?;
                    Ok(())
                }
            }),
        )
    }

    fn fanout() -> FanOut<CountingSink> {
        FanOut::new(
            Arc::new(CountingSink::default()),
            Arc::new(DeliveryTarget::new("/bin/true", "sheet-id", "/etc/auth.json")),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_batches_are_fanned_out() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 30).unwrap()));
        let source = Arc::new(
            StaticSource::new()
                .with_series("mfr", "a\n")
                .with_series("mbs", "b\n"),
        );
        let fanout = fanout();
        let logger = Arc::new(MemoryLogger::new());

        let mut scheduler = PeriodicScheduler::new(logger.clone(), clock.clone());
        scheduler
            .spawn(mining_job(Arc::clone(&source), fanout.clone(), clock))
            .unwrap();

        // runs at +30s, +90s, +150s
        tokio::time::sleep(Duration::from_secs(151)).await;
        let summaries = scheduler.shutdown().await;

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].runs, 3);
        assert_eq!(summaries[0].failures, 0);
        assert_eq!(fanout.sink().delivered.load(Ordering::SeqCst), 9);
        assert_eq!(source.renders(), 6);
        assert!(logger.messages_at(LogLevel::Error).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_skips_delivery_and_keeps_schedule() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()));
        let source = Arc::new(
            StaticSource::new()
                .with_series("mfr", "a\n")
                .with_series("mbs", "b\n")
                .failing("mbs"),
        );
        let fanout = fanout();
        let logger = Arc::new(MemoryLogger::new());

        let mut scheduler = PeriodicScheduler::new(logger.clone(), clock.clone());
        scheduler
            .spawn(mining_job(source, fanout.clone(), clock))
            .unwrap();

        // on a boundary the first run waits a full period: +60s, +120s
        tokio::time::sleep(Duration::from_secs(121)).await;
        let summaries = scheduler.shutdown().await;

        assert_eq!(summaries[0].runs, 2);
        assert_eq!(summaries[0].failures, 2);
        assert_eq!(fanout.sink().delivered.load(Ordering::SeqCst), 0);
        assert_eq!(logger.messages_at(LogLevel::Error).len(), 2);
        assert!(logger.contains("job mining failed"));
    }
}
