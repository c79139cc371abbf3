//! SubprocessSink - pipes a payload into an external delivery program
//!
//! One delivery is up to `max_attempts` launch-to-exit attempts. Each attempt
//! runs the program as `program <spreadsheet_id> <worksheet> <auth_ref>`,
//! streams the CSV to stdin from a writer task, drains stderr from a second
//! task, and escalates SIGINT then SIGKILL if the program overruns.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use contracts::{DeliveryOutcome, DeliveryPolicy, DeliverySink, DeliveryTarget, Payload};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, warn};

use crate::error::AttemptError;
use crate::metrics::SinkMetrics;

/// How long stderr may stay open after the program exited
///
/// A grandchild can inherit the pipe and keep it open indefinitely.
const STDERR_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Interrupt,
    Kill,
}

impl Signal {
    fn as_str(self) -> &'static str {
        match self {
            Self::Interrupt => "interrupt",
            Self::Kill => "kill",
        }
    }
}

/// Escalation state of a running attempt
#[derive(Debug, Default, Clone, Copy)]
struct AwaitingExit {
    interrupted: bool,
    killed: bool,
}

/// Sink that hands each payload to an external program
pub struct SubprocessSink {
    name: String,
    policy: DeliveryPolicy,
    metrics: Arc<SinkMetrics>,
}

impl SubprocessSink {
    /// Create a new SubprocessSink with the given retry/escalation policy
    pub fn new(name: impl Into<String>, policy: DeliveryPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Shared counters of this sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    async fn attempt(&self, payload: &Payload, target: &DeliveryTarget) -> Result<(), AttemptError> {
        let mut command = Command::new(&target.program);
        command
            .arg(&target.spreadsheet_id)
            .arg(&payload.destination)
            .arg(&target.auth_ref)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        isolate(&mut command);
        let mut child = command.spawn().map_err(AttemptError::Launch)?;

        let (Some(stdin), Some(stderr)) = (child.stdin.take(), child.stderr.take()) else {
            // kill() also reaps
            let _ = child.kill().await;
            return Err(AttemptError::Pipe("stdin/stderr"));
        };

        let body = payload.body.clone();
        let writer = tokio::spawn(async move {
            let mut stdin = stdin;
            if let Err(e) = stdin.write_all(&body).await {
                debug!(error = %e, "stdin write failed");
            }
            let _ = stdin.shutdown().await;
        });
        let drainer = tokio::spawn(read_stderr(stderr));

        let waited = self.wait_with_escalation(&mut child).await;
        writer.abort();

        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                drainer.abort();
                return Err(AttemptError::Wait(e));
            }
        };

        if status.success() {
            drainer.abort();
            return Ok(());
        }

        let stderr = collect_stderr(drainer).await;
        Err(AttemptError::Exit { status, stderr })
    }

    /// Wait for exit; both timers are armed at launch and dropped on exit
    async fn wait_with_escalation(&self, child: &mut Child) -> std::io::Result<ExitStatus> {
        let interrupt = sleep(self.policy.interrupt_after());
        let kill = sleep(self.policy.kill_after());
        tokio::pin!(interrupt, kill);

        let mut state = AwaitingExit::default();
        loop {
            let signal = tokio::select! {
                status = child.wait() => return status,
                () = &mut interrupt, if !state.interrupted => Signal::Interrupt,
                () = &mut kill, if !state.killed => Signal::Kill,
            };

            match signal {
                Signal::Interrupt => state.interrupted = true,
                Signal::Kill => state.killed = true,
            }
            self.escalate(child, signal);
        }
    }

    fn escalate(&self, child: &mut Child, signal: Signal) {
        match send_signal(child, signal) {
            Ok(()) => {
                match signal {
                    Signal::Interrupt => self.metrics.inc_interrupts_sent(),
                    Signal::Kill => self.metrics.inc_kills_sent(),
                }
                observability::record_signal_sent(signal.as_str());
                warn!(
                    sink = %self.name,
                    signal = signal.as_str(),
                    pid = ?child.id(),
                    "Delivery program overran, signal sent"
                );
            }
            Err(e) => {
                warn!(
                    sink = %self.name,
                    signal = signal.as_str(),
                    error = %e,
                    "Failed to signal delivery program"
                );
            }
        }
    }
}

/// Own process group, default SIGINT disposition
///
/// A terminal Ctrl+C or a group-wide SIGTERM aimed at this process must not
/// reach a running delivery; only the escalation below signals it.
#[cfg(unix)]
fn isolate(command: &mut Command) {
    command.process_group(0);
    // SAFETY: signal(2) is async-signal-safe, nothing else runs between fork and exec.
    unsafe {
        command.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn isolate(_command: &mut Command) {}

#[cfg(unix)]
fn send_signal(child: &mut Child, signal: Signal) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        // already reaped
        return Ok(());
    };
    let signo = match signal {
        Signal::Interrupt => libc::SIGINT,
        Signal::Kill => libc::SIGKILL,
    };
    // SAFETY: `pid` is our direct child and has not been reaped yet
    // (`Child::id` returns None once it has), so it cannot have been reused.
    let rc = unsafe { libc::kill(pid as libc::pid_t, signo) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn send_signal(child: &mut Child, signal: Signal) -> std::io::Result<()> {
    match signal {
        Signal::Interrupt => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "interrupt is not supported on this platform",
        )),
        Signal::Kill => child.start_kill(),
    }
}

async fn read_stderr(mut stderr: ChildStderr) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = stderr.read_to_end(&mut buf).await;
    buf
}

async fn collect_stderr(mut drainer: JoinHandle<Vec<u8>>) -> String {
    match timeout(STDERR_GRACE, &mut drainer).await {
        Ok(Ok(buf)) => String::from_utf8_lossy(&buf).trim_end().to_string(),
        Ok(Err(_)) => String::new(),
        Err(_) => {
            drainer.abort();
            debug!("stderr still open after exit, abandoning it");
            String::new()
        }
    }
}

impl DeliverySink for SubprocessSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "subprocess_sink_deliver",
        skip(self, payload, target),
        fields(sink = %self.name, worksheet = %payload.destination, bytes = payload.len())
    )]
    async fn deliver(&self, payload: &Payload, target: &DeliveryTarget) -> DeliveryOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.metrics.inc_attempts();
            match self.attempt(payload, target).await {
                Ok(()) => {
                    self.metrics.inc_successes();
                    observability::record_delivery_attempt(&payload.destination, true);
                    debug!(attempt, "Payload delivered");
                    return DeliveryOutcome::delivered(attempt);
                }
                Err(e) => {
                    self.metrics.inc_failed_attempts();
                    observability::record_delivery_attempt(&payload.destination, false);
                    warn!(attempt, max_attempts, error = %e, "Delivery attempt failed");
                    last_error = Some(e);
                }
            }
        }

        self.metrics.inc_exhausted();
        observability::record_delivery_exhausted(&payload.destination);
        let diagnostic = last_error.map(|e| e.diagnostic()).unwrap_or_default();
        DeliveryOutcome::failed(diagnostic, max_attempts)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Instant;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("deliver.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn invocations(counter: &Path) -> usize {
        std::fs::read_to_string(counter)
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    fn quick_policy() -> DeliveryPolicy {
        DeliveryPolicy::new(3, Duration::from_secs(10), Duration::from_secs(20))
    }

    fn target(program: PathBuf) -> DeliveryTarget {
        DeliveryTarget::new(program, "sheet-id", "/etc/auth.json")
    }

    #[tokio::test]
    async fn test_always_failing_program_runs_three_times() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("count");
        let program = script(
            dir.path(),
            &format!(
                "echo run >> {}\necho 'quota exceeded' >&2\nexit 1",
                counter.display()
            ),
        );

        let sink = SubprocessSink::new("gspread", quick_policy());
        let outcome = sink
            .deliver(&Payload::new("profile_conf", "a,b\n"), &target(program))
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(invocations(&counter), 3);
        assert!(outcome.diagnostic().contains("quota exceeded"), "got: {}", outcome.diagnostic());
        assert!(outcome.diagnostic().contains("exit status"), "got: {}", outcome.diagnostic());

        let snapshot = sink.metrics().snapshot();
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.failed_attempts, 3);
        assert_eq!(snapshot.exhausted, 1);
        assert_eq!(snapshot.successes, 0);
    }

    #[tokio::test]
    async fn test_succeeds_on_second_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("count");
        let program = script(
            dir.path(),
            &format!(
                "echo run >> {c}\nif [ \"$(wc -l < {c})\" -ge 2 ]; then exit 0; fi\nexit 1",
                c = counter.display()
            ),
        );

        let sink = SubprocessSink::new("gspread", quick_policy());
        let outcome = sink
            .deliver(&Payload::new("1m", "x\n"), &target(program))
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(invocations(&counter), 2);
        assert!(outcome.diagnostic.is_none());
    }

    #[tokio::test]
    async fn test_body_on_stdin_and_positional_args() {
        let dir = tempfile::tempdir().unwrap();
        let body_out = dir.path().join("body");
        let args_out = dir.path().join("args");
        let program = script(
            dir.path(),
            &format!(
                "cat > {}\necho \"$1|$2|$3\" > {}",
                body_out.display(),
                args_out.display()
            ),
        );

        let sink = SubprocessSink::new("gspread", quick_policy());
        let outcome = sink
            .deliver(&Payload::new("mining_mfr", "t,mfr\n1,0.5\n"), &target(program))
            .await;

        assert!(outcome.succeeded, "diagnostic: {}", outcome.diagnostic());
        assert_eq!(std::fs::read_to_string(&body_out).unwrap(), "t,mfr\n1,0.5\n");
        assert_eq!(
            std::fs::read_to_string(&args_out).unwrap().trim_end(),
            "sheet-id|mining_mfr|/etc/auth.json"
        );
    }

    fn signals(sink: &SubprocessSink) -> (u64, u64) {
        let snapshot = sink.metrics().snapshot();
        (snapshot.interrupts_sent, snapshot.kills_sent)
    }

    #[tokio::test]
    async fn test_hanging_program_is_interrupted_then_killed() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("signals");
        let program = script(
            dir.path(),
            &format!(
                "trap 'echo interrupted >> {}' INT\nwhile true; do sleep 0.1; done",
                log.display()
            ),
        );

        let policy = DeliveryPolicy::new(1, Duration::from_millis(250), Duration::from_millis(900));
        let sink = Arc::new(SubprocessSink::new("gspread", policy));

        let started = Instant::now();
        let delivery = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move {
                sink.deliver(&Payload::new("3h", "x\n"), &target(program))
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(signals(&sink), (0, 0), "signalled before interrupt_after");

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(signals(&sink), (1, 0), "interrupt must precede kill");
        assert_eq!(std::fs::read_to_string(&log).unwrap().trim_end(), "interrupted");

        let outcome = delivery.await.unwrap();
        assert!(!outcome.succeeded);
        assert!(started.elapsed() >= Duration::from_millis(900));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(outcome.diagnostic().contains("signal"), "got: {}", outcome.diagnostic());
        assert_eq!(signals(&sink), (1, 1));
    }

    #[tokio::test]
    async fn test_program_exiting_on_interrupt_is_not_killed() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "exec sleep 30");

        let policy = DeliveryPolicy::new(1, Duration::from_millis(200), Duration::from_secs(5));
        let sink = SubprocessSink::new("gspread", policy);

        let started = Instant::now();
        let outcome = sink
            .deliver(&Payload::new("1d", "x\n"), &target(program))
            .await;

        assert!(!outcome.succeeded);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(outcome.diagnostic().contains("signal"), "got: {}", outcome.diagnostic());
        assert_eq!(signals(&sink), (1, 0));
    }

    #[tokio::test]
    async fn test_program_runs_in_its_own_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let go = dir.path().join("go");
        let program = script(
            dir.path(),
            &format!(
                "echo $$ > {pid}.tmp && mv {pid}.tmp {pid}\nwhile [ ! -f {go} ]; do sleep 0.05; done\ncat > /dev/null",
                pid = pid_file.display(),
                go = go.display()
            ),
        );

        let sink = Arc::new(SubprocessSink::new("gspread", quick_policy()));
        let delivery = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move {
                sink.deliver(&Payload::new("profile_conf", "a\n"), &target(program))
                    .await
            }
        });

        let pid: libc::pid_t = loop {
            if let Ok(text) = std::fs::read_to_string(&pid_file) {
                break text.trim().parse().unwrap();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        };

        // a signal sent to our own group (terminal Ctrl+C) cannot reach it
        let (group, ours) = unsafe { (libc::getpgid(pid), libc::getpgrp()) };
        assert_eq!(group, pid);
        assert_ne!(group, ours);

        std::fs::write(&go, "").unwrap();
        let outcome = delivery.await.unwrap();
        assert!(outcome.succeeded, "diagnostic: {}", outcome.diagnostic());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(signals(&sink), (0, 0));
    }

    #[tokio::test]
    async fn test_missing_program_counts_as_failed_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SubprocessSink::new("gspread", quick_policy());

        let outcome = sink
            .deliver(
                &Payload::new("30m", "x\n"),
                &target(dir.path().join("does-not-exist")),
            )
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.diagnostic().starts_with("failed to launch delivery program"));
        assert_eq!(sink.metrics().snapshot().attempts, 3);
    }

    #[tokio::test]
    async fn test_program_ignoring_stdin_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "exit 0");

        let sink = SubprocessSink::new("gspread", quick_policy());
        let body = "x".repeat(256 * 1024);
        let outcome = sink
            .deliver(&Payload::new("predictscores", body), &target(program))
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 1);
    }
}
