//! Drives the downloader poll loop against small shell scripts standing in for aria2c.
#![cfg(unix)]

mod common;

use common::{CatalogState, ScriptedMonitor, StubCatalog, StubLookup, session_routed};
use iaseek::app::{ActionRouter, Command, Flow, NoticeLevel, RouterSettings, SessionSettings, View};
use iaseek::core::download::{
    DownloadOrchestrator, DownloadSettings, DownloadTask, ExternalCommand, Keystroke, Outcome,
    TaskStatus,
};
use iaseek::core::launch::ProviderChain;
use std::error;
use std::fs;
use std::process;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn sh_available() -> bool {
    which::which("sh").is_ok()
}

macro_rules! skip_if_no_sh {
    () => {
        if !sh_available() {
            return Ok(());
        }
    };
}

/// An orchestrator whose "aria2c" is `sh -c <script>`; the aria2 arguments land in `$@`.
fn scripted(script: &str) -> DownloadOrchestrator {
    DownloadOrchestrator::new(DownloadSettings {
        aria2: Some(ExternalCommand::new("sh").with_args(["-c", script, "aria2c"])),
        fallback: false,
        poll_interval: Duration::from_millis(10),
        ..DownloadSettings::default()
    })
}

#[test]
fn successful_child_streams_output_in_order() -> Result<(), Box<dyn error::Error>> {
    skip_if_no_sh!();
    let dir = tempdir()?;
    let dest = dir.path().join("dl");
    let orch = scripted("echo 'first'; printf 'second\\rthird\\n'; echo \"last $#\"");

    let mut task = DownloadTask::new("https://example.org/a.iso", &dest, "a.iso", 4);
    let mut monitor = ScriptedMonitor::default();
    let outcome = orch.run(&mut task, &mut monitor);

    assert_eq!(outcome, Outcome::Succeeded);
    assert_eq!(task.status(), TaskStatus::Succeeded);
    assert!(dest.is_dir(), "destination is created before the child starts");

    let output: Vec<&str> = monitor
        .lines
        .iter()
        .map(String::as_str)
        .filter(|l| !l.starts_with("aria2c ->"))
        .collect();
    // --continue, --max-connection-per-server, --split, --dir, --console-log-level, url
    assert_eq!(output, ["first", "second", "third", "last 6"]);
    Ok(())
}

#[test]
fn nonzero_exit_is_a_failure_with_the_code() -> Result<(), Box<dyn error::Error>> {
    skip_if_no_sh!();
    let dir = tempdir()?;
    let orch = scripted("echo 'errorCode=3' >&2; exit 3");

    let mut task = DownloadTask::new("https://example.org/b.iso", dir.path(), "b.iso", 4);
    let mut monitor = ScriptedMonitor::default();
    let outcome = orch.run(&mut task, &mut monitor);

    let Outcome::Failed(reason) = outcome else {
        return Err(format!("expected a failure, got {:?}", outcome).into());
    };
    assert!(reason.contains('3'), "reason should carry the exit code: {}", reason);
    assert_eq!(task.status(), TaskStatus::Failed);
    assert!(monitor.lines.iter().any(|l| l == "errorCode=3"));
    Ok(())
}

#[test]
fn cancel_key_stops_a_long_download() -> Result<(), Box<dyn error::Error>> {
    skip_if_no_sh!();
    let dir = tempdir()?;
    let orch = scripted("exec sleep 5");

    let mut task = DownloadTask::new("https://example.org/c.iso", dir.path(), "c.iso", 4);
    let mut monitor = ScriptedMonitor {
        interrupt: Some(Keystroke::Cancel),
        ..ScriptedMonitor::default()
    };

    let started = Instant::now();
    let outcome = orch.run(&mut task, &mut monitor);

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(4));
    Ok(())
}

#[test]
fn quit_key_ends_with_quit() -> Result<(), Box<dyn error::Error>> {
    skip_if_no_sh!();
    let dir = tempdir()?;
    let orch = scripted("exec sleep 5");

    let mut task = DownloadTask::new("https://example.org/d.iso", dir.path(), "d.iso", 4);
    let mut monitor = ScriptedMonitor {
        interrupt: Some(Keystroke::Quit),
        ..ScriptedMonitor::default()
    };

    assert_eq!(orch.run(&mut task, &mut monitor), Outcome::Quit);
    Ok(())
}

#[test]
fn missing_configured_binary_without_fallback_fails() -> Result<(), Box<dyn error::Error>> {
    let dir = tempdir()?;
    let dest = dir.path().join("untouched");
    let orch = DownloadOrchestrator::new(DownloadSettings {
        aria2: Some(ExternalCommand::new("/nonexistent/aria2c-for-tests")),
        fallback: false,
        ..DownloadSettings::default()
    });

    let mut task = DownloadTask::new("https://example.org/e.iso", &dest, "e.iso", 4);
    let resolved = orch.resolve_backend(&task);
    // A real aria2c on PATH is picked up instead of the missing one.
    if which::which("aria2c").is_ok() {
        assert!(resolved.is_ok());
        return Ok(());
    }

    assert!(resolved.is_err());
    let outcome = orch.run(&mut task, &mut ScriptedMonitor::default());
    assert!(matches!(outcome, Outcome::Failed(_)));
    assert!(!dest.exists());
    Ok(())
}

#[test]
fn cancel_from_the_file_view_reaps_the_downloader() -> Result<(), Box<dyn error::Error>> {
    skip_if_no_sh!();
    let dir = tempdir()?;
    let pid_file = dir.path().join("aria2c.pid");
    let script = format!(
        "echo $$ > '{}'; echo started; exec sleep 5",
        pid_file.display()
    );
    let router = ActionRouter::new(
        Box::new(StubLookup {
            hit: None,
            fail: false,
        }),
        ProviderChain::new("clipboard", Vec::new()),
        ProviderChain::new("open", Vec::new()),
        scripted(&script),
        RouterSettings {
            download_dir: dir.path().join("dl"),
            dry_run: false,
        },
    );
    let catalog = StubCatalog::new(3, Rc::new(CatalogState::default()));
    let mut s = session_routed(catalog, router, SessionSettings::default())?;

    s.dispatch(Command::Select(1), &mut ScriptedMonitor::default());
    s.dispatch(Command::Select(1), &mut ScriptedMonitor::default());
    assert!(matches!(s.view(), View::FileAction(..)));
    s.take_notices();

    let mut monitor = ScriptedMonitor {
        interrupt: Some(Keystroke::Cancel),
        wait_for: Some("started".into()),
        ..ScriptedMonitor::default()
    };
    let started = Instant::now();
    let flow = s.dispatch(Command::Download, &mut monitor);

    assert_eq!(flow, Flow::Continue);
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(monitor.lines.iter().any(|l| l == "started"));
    assert!(matches!(s.view(), View::ItemFiles(_)));

    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level(), NoticeLevel::Warn);
    assert!(notices[0].text().contains("cancelled"), "{}", notices[0].text());

    // The downloader was killed and reaped, so its pid no longer names a process.
    let pid = fs::read_to_string(&pid_file)?;
    let alive = process::Command::new("kill")
        .args(["-0", pid.trim()])
        .stderr(process::Stdio::null())
        .status()?;
    assert!(!alive.success(), "aria2c stand-in {} is still around", pid.trim());
    Ok(())
}
