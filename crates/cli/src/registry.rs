//! JobRegistry - configuration names to runnable tasks
//!
//! Every known name is bound to a fixed sheet set. Names are resolved before
//! anything is scheduled, so an unknown name never reaches the scheduler.

use std::sync::Arc;

use collector::{SheetSet, collect_batch};
use contracts::{DeliverySink, JobSpec, PayloadSource};
use dispatcher::FanOut;
use scheduler::{Clock, ScheduledJob, Task, task};

use crate::error::CliError;

const KNOWN_JOBS: [&str; 7] = ["1m", "30m", "3h", "1d", "profile", "mining", "scores"];

/// Fixed table of job names
pub struct JobRegistry;

impl JobRegistry {
    pub fn known_names() -> &'static [&'static str] {
        &KNOWN_JOBS
    }

    /// Sheet set delivered by `name`
    pub fn sheet_set(name: &str) -> Option<SheetSet> {
        let set = match name {
            "1m" | "30m" | "3h" | "1d" => SheetSet::single(format!("main_{name}"), name),
            "profile" => SheetSet::prefixed("profile", &["conf", "txrate", "caprate", "mempool"])
                .with_timestamp("profile_time"),
            "mining" => SheetSet::prefixed("mining", &["mfr", "mbs"]).with_timestamp("mining_time"),
            "scores" => SheetSet::single("predictscores", "predictscores")
                .with_timestamp("predictscores_time"),
            _ => return None,
        };
        Some(set)
    }

    pub fn resolve(name: &str) -> Result<SheetSet, CliError> {
        Self::sheet_set(name).ok_or_else(|| CliError::unknown_job(name, &KNOWN_JOBS))
    }

    /// Resolve every spec without building anything
    pub fn check(specs: &[JobSpec]) -> Result<(), CliError> {
        specs.iter().try_for_each(|spec| Self::resolve(&spec.name).map(|_| ()))
    }

    /// Build a runnable job for every spec
    ///
    /// Each run renders every series of the job's sheet set (a render error
    /// fails the run before anything is delivered), then fans the batch out.
    pub fn build<S, P>(
        specs: &[JobSpec],
        source: Arc<P>,
        fanout: FanOut<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Vec<ScheduledJob>, CliError>
    where
        S: DeliverySink + Sync + 'static,
        P: PayloadSource + Sync + 'static,
    {
        specs
            .iter()
            .map(|spec| {
                let set = Self::resolve(&spec.name)?;
                let task = delivery_task(set, Arc::clone(&source), fanout.clone(), Arc::clone(&clock));
                Ok(ScheduledJob::new(spec.clone(), task))
            })
            .collect()
    }
}

fn delivery_task<S, P>(
    set: SheetSet,
    source: Arc<P>,
    fanout: FanOut<S>,
    clock: Arc<dyn Clock>,
) -> Task
where
    S: DeliverySink + Sync + 'static,
    P: PayloadSource + Sync + 'static,
{
    let set = Arc::new(set);
    task(move || {
        let set = Arc::clone(&set);
        let source = Arc::clone(&source);
        let fanout = fanout.clone();
        let now = clock.now();
        async move {
            let payloads = collect_batch(&*source, &set, now).await?;
            fanout.deliver_all(payloads).await?;
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use collector::StaticSource;
    use contracts::{DeliveryOutcome, DeliveryTarget, Payload};
    use scheduler::FixedClock;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<(String, String)>>,
    }

    impl DeliverySink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, payload: &Payload, _target: &DeliveryTarget) -> DeliveryOutcome {
            let body = String::from_utf8_lossy(&payload.body).to_string();
            self.delivered
                .lock()
                .unwrap()
                .push((payload.destination.clone(), body));
            DeliveryOutcome::delivered(1)
        }
    }

    fn spec(name: &str) -> JobSpec {
        JobSpec::new(name, Duration::from_secs(600), Duration::ZERO)
    }

    fn full_source() -> StaticSource {
        ["main_1m", "conf", "txrate", "caprate", "mempool", "mfr", "mbs", "predictscores"]
            .into_iter()
            .fold(StaticSource::new(), |source, series| {
                source.with_series(series, format!("{series}\n"))
            })
    }

    #[test]
    fn test_every_known_name_resolves() {
        for name in JobRegistry::known_names() {
            assert!(JobRegistry::sheet_set(name).is_some(), "{name}");
        }
        let profile = JobRegistry::resolve("profile").unwrap();
        assert_eq!(
            profile.worksheets().collect::<Vec<_>>(),
            vec!["profile_conf", "profile_txrate", "profile_caprate", "profile_mempool", "profile_time"]
        );
        assert_eq!(
            JobRegistry::resolve("3h").unwrap().worksheets().collect::<Vec<_>>(),
            vec!["3h"]
        );
    }

    #[test]
    fn test_unknown_name_lists_known_ones() {
        let err = JobRegistry::check(&[spec("profile"), spec("hourly")]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown job 'hourly'"), "got: {message}");
        assert!(message.contains("profile, mining, scores"), "got: {message}");
    }

    #[tokio::test]
    async fn test_built_task_delivers_sheet_set() {
        let sink = Arc::new(RecordingSink::default());
        let fanout = FanOut::new(
            Arc::clone(&sink),
            Arc::new(DeliveryTarget::new("/bin/true", "sheet", "auth")),
        );
        let now = chrono::DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z")
            .unwrap()
            .to_utc();

        let jobs = JobRegistry::build(
            &[spec("mining"), spec("1m")],
            Arc::new(full_source()),
            fanout,
            Arc::new(FixedClock(now)),
        )
        .unwrap();
        assert_eq!(jobs.len(), 2);

        jobs[0].run_once().await.unwrap();

        let mut delivered = sink.delivered.lock().unwrap().clone();
        delivered.sort();
        assert_eq!(
            delivered,
            vec![
                ("mining_mbs".to_string(), "mbs\n".to_string()),
                ("mining_mfr".to_string(), "mfr\n".to_string()),
                ("mining_time".to_string(), "timestr\n01 May 24 08:30 UTC\n".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_render_failure_delivers_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let fanout = FanOut::new(
            Arc::clone(&sink),
            Arc::new(DeliveryTarget::new("/bin/true", "sheet", "auth")),
        );
        let source = StaticSource::new().with_series("conf", "c\n").failing("txrate");

        let jobs = JobRegistry::build(
            &[spec("profile")],
            Arc::new(source),
            fanout,
            Arc::new(scheduler::SystemClock),
        )
        .unwrap();

        let err = jobs[0].run_once().await.unwrap_err();
        assert!(err.to_string().contains("txrate"), "got: {err}");
        assert!(sink.delivered.lock().unwrap().is_empty());
    }
}
