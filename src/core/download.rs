//! Download orchestration for iaseek.
//!
//! A [DownloadTask] is handed to [DownloadOrchestrator::run], which picks a backend
//! (an external `aria2c` process, or a built-in single connection HTTP fetch), starts it and
//! then supervises it with one cooperative poll loop:
//!
//! 1. ask the [DownloadMonitor] for a pending keystroke,
//! 2. forward any pending progress lines to the monitor,
//! 3. check whether the backend has finished,
//! 4. otherwise sleep for the poll interval.
//!
//! Progress lines reach the loop through a crossbeam channel fed by reader threads, so the
//! loop itself never blocks on child output. Cancellation therefore takes effect within one
//! poll interval.
//!
//! Exactly one task runs at a time, so the destination directory needs no locking.

use crate::core::formatter::format_file_size;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a cancelled backend gets to go away before we stop waiting for it.
const ABORT_GRACE: Duration = Duration::from_secs(2);

/// How long trailing output is collected after the backend finished.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Interval between progress lines of the built-in fetch.
const PROGRESS_EVERY: Duration = Duration::from_millis(500);

const FETCH_BUFFER: usize = 64 * 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// A single keystroke that interrupts a running download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// Stop this download and return to the file list.
    Cancel,
    /// Stop this download and end the session.
    Quit,
}

/// The side of the poll loop that faces the user.
pub trait DownloadMonitor {
    /// Non-blocking check for an interrupt key.
    fn poll_interrupt(&mut self) -> Option<Keystroke>;
    /// Shows one progress line.
    fn emit(&mut self, line: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
    Cancelled,
    /// Cancelled by a quit keystroke; the session ends.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// One confirmed download. Discarded once the file action view is left.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    locator: String,
    dest: PathBuf,
    file_name: String,
    connections: usize,
    is_torrent: bool,
    status: TaskStatus,
}

impl DownloadTask {
    pub fn new(
        locator: impl Into<String>,
        dest: impl Into<PathBuf>,
        file_name: impl Into<String>,
        connections: usize,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            locator: locator.into(),
            dest: dest.into(),
            is_torrent: file_name
                .to_lowercase()
                .ends_with(crate::core::model::TORRENT_SUFFIX),
            file_name,
            connections: connections.max(1),
            status: TaskStatus::Pending,
        }
    }

    #[inline]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    #[inline]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn connections(&self) -> usize {
        self.connections
    }

    #[inline]
    pub fn is_torrent(&self) -> bool {
        self.is_torrent
    }

    #[inline]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Local path the built-in fetch writes to.
    pub fn target_path(&self) -> PathBuf {
        let base = Path::new(&self.file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("download"));
        self.dest.join(base)
    }
}

/// An external program plus the arguments that always precede the per-task ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    #[inline]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Configured downloader. `None` means look up `aria2c` on `PATH`.
    pub aria2: Option<ExternalCommand>,
    pub use_aria2: bool,
    pub fallback: bool,
    pub verbose: bool,
    pub poll_interval: Duration,
    pub max_connections: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            aria2: None,
            use_aria2: true,
            fallback: true,
            verbose: false,
            poll_interval: Duration::from_millis(50),
            max_connections: 16,
        }
    }
}

/// The resolved way of running one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Aria2(ExternalCommand),
    Http,
}

pub struct DownloadOrchestrator {
    settings: DownloadSettings,
}

impl DownloadOrchestrator {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    #[inline]
    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    /// Picks the backend for `task`, or the reason none can run it.
    pub fn resolve_backend(&self, task: &DownloadTask) -> Result<Backend, String> {
        if self.settings.use_aria2 {
            if let Some(cmd) = &self.settings.aria2 {
                match which::which(cmd.program()) {
                    Ok(path) => {
                        return Ok(Backend::Aria2(ExternalCommand {
                            program: path,
                            leading_args: cmd.leading_args.clone(),
                        }));
                    }
                    Err(_) => warn!(
                        program = %cmd.program().display(),
                        "configured aria2c not found, trying PATH"
                    ),
                }
            }
            if let Ok(path) = which::which("aria2c") {
                return Ok(Backend::Aria2(ExternalCommand::new(path)));
            }
        }

        if self.settings.fallback {
            if task.is_torrent() {
                return Err(format!(
                    "{} is a torrent; the built-in fetch cannot download torrents, install aria2c",
                    task.file_name()
                ));
            }
            return Ok(Backend::Http);
        }

        Err("no downloader available: aria2c not found and the built-in fetch is disabled".into())
    }

    /// Runs `task` to completion, cancellation or failure.
    pub fn run(&self, task: &mut DownloadTask, monitor: &mut dyn DownloadMonitor) -> Outcome {
        let backend = match self.resolve_backend(task) {
            Ok(b) => b,
            Err(reason) => return self.finish(task, Outcome::Failed(reason)),
        };

        if let Err(e) = fs::create_dir_all(task.dest()) {
            return self.finish(
                task,
                Outcome::Failed(format!(
                    "cannot create {}: {}",
                    task.dest().display(),
                    e
                )),
            );
        }

        task.status = TaskStatus::Running;
        info!(locator = task.locator(), dest = %task.dest().display(), ?backend, "download started");

        let outcome = match backend {
            Backend::Aria2(cmd) => self.run_aria2(&cmd, task, monitor),
            Backend::Http => self.run_http(task, monitor),
        };
        self.finish(task, outcome)
    }

    fn finish(&self, task: &mut DownloadTask, outcome: Outcome) -> Outcome {
        task.status = match outcome {
            Outcome::Succeeded => TaskStatus::Succeeded,
            Outcome::Failed(_) => TaskStatus::Failed,
            Outcome::Cancelled | Outcome::Quit => TaskStatus::Cancelled,
        };
        info!(locator = task.locator(), ?outcome, "download finished");
        outcome
    }

    /// Per-task arguments passed to aria2c.
    pub fn aria2_args(&self, task: &DownloadTask) -> Vec<OsString> {
        let n = task.connections().min(self.settings.max_connections.max(1));
        let mut args: Vec<OsString> = vec![
            "--continue=true".into(),
            format!("--max-connection-per-server={}", n).into(),
            format!("--split={}", n).into(),
        ];
        let mut dir = OsString::from("--dir=");
        dir.push(task.dest().as_os_str());
        args.push(dir);
        if !self.settings.verbose {
            args.push("--console-log-level=error".into());
        }
        args.push(task.locator().into());
        args
    }

    fn run_aria2(
        &self,
        cmd: &ExternalCommand,
        task: &DownloadTask,
        monitor: &mut dyn DownloadMonitor,
    ) -> Outcome {
        let args = self.aria2_args(task);
        debug!(program = %cmd.program().display(), ?args, "spawning downloader");

        let spawned = Command::new(cmd.program())
            .args(&cmd.leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return Outcome::Failed(format!(
                    "failed to start {}: {}",
                    cmd.program().display(),
                    e
                ));
            }
        };

        monitor.emit(&format!("aria2c -> {}", task.dest().display()));

        let (line_tx, line_rx) = unbounded::<String>();
        if let Some(out) = child.stdout.take() {
            spawn_line_reader(out, line_tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            spawn_line_reader(err, line_tx.clone());
        }
        drop(line_tx);

        let mut job = ChildJob { child };
        self.supervise(&mut job, &line_rx, monitor)
    }

    fn run_http(&self, task: &DownloadTask, monitor: &mut dyn DownloadMonitor) -> Outcome {
        let cancel = Arc::new(AtomicBool::new(false));
        let (line_tx, line_rx) = unbounded::<String>();
        let (done_tx, done_rx) = unbounded::<Result<u64, String>>();

        let locator = task.locator().to_string();
        let path = task.target_path();
        monitor.emit(&format!("fetching -> {}", path.display()));

        let worker_cancel = Arc::clone(&cancel);
        thread::spawn(move || {
            let result = http_fetch(&locator, &path, &worker_cancel, &line_tx);
            let _ = done_tx.send(result);
        });

        let mut job = FetchJob { cancel, done_rx };
        self.supervise(&mut job, &line_rx, monitor)
    }

    fn supervise(
        &self,
        job: &mut dyn Job,
        lines: &Receiver<String>,
        monitor: &mut dyn DownloadMonitor,
    ) -> Outcome {
        loop {
            if let Some(key) = monitor.poll_interrupt() {
                debug!(?key, "download interrupted");
                job.abort();
                while let Ok(line) = lines.try_recv() {
                    monitor.emit(&line);
                }
                return match key {
                    Keystroke::Cancel => Outcome::Cancelled,
                    Keystroke::Quit => Outcome::Quit,
                };
            }

            loop {
                match lines.try_recv() {
                    Ok(line) => monitor.emit(&line),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            if let Some(outcome) = job.finished() {
                drain_until_closed(lines, monitor);
                return outcome;
            }

            thread::sleep(self.settings.poll_interval);
        }
    }
}

/// A running backend as seen by the poll loop.
trait Job {
    /// Non-blocking completion check.
    fn finished(&mut self) -> Option<Outcome>;
    /// Stops the backend, waiting at most [ABORT_GRACE].
    fn abort(&mut self);
}

struct ChildJob {
    child: Child,
}

impl Job for ChildJob {
    fn finished(&mut self) -> Option<Outcome> {
        match self.child.try_wait() {
            Ok(Some(status)) if status.success() => Some(Outcome::Succeeded),
            Ok(Some(status)) => Some(Outcome::Failed(match status.code() {
                Some(code) => format!("aria2c exited with code {}", code),
                None => "aria2c was terminated by a signal".to_string(),
            })),
            Ok(None) => None,
            Err(e) => Some(Outcome::Failed(format!("lost track of aria2c: {}", e))),
        }
    }

    fn abort(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!(error = %e, "kill failed, child probably already exited");
        }
        let deadline = Instant::now() + ABORT_GRACE;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(_)) | Err(_) => return,
                Ok(None) => thread::sleep(Duration::from_millis(20)),
            }
        }
        warn!("downloader did not exit after kill");
    }
}

struct FetchJob {
    cancel: Arc<AtomicBool>,
    done_rx: Receiver<Result<u64, String>>,
}

impl Job for FetchJob {
    fn finished(&mut self) -> Option<Outcome> {
        match self.done_rx.try_recv() {
            Ok(Ok(_)) => Some(Outcome::Succeeded),
            Ok(Err(reason)) => Some(Outcome::Failed(reason)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Outcome::Failed("fetch worker stopped unexpectedly".into()))
            }
        }
    }

    fn abort(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if self.done_rx.recv_timeout(ABORT_GRACE).is_err() {
            warn!("fetch worker did not stop in time");
        }
    }
}

fn drain_until_closed(lines: &Receiver<String>, monitor: &mut dyn DownloadMonitor) {
    let deadline = Instant::now() + DRAIN_GRACE;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match lines.recv_timeout(left) {
            Ok(line) => monitor.emit(&line),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Forwards a pipe line by line, treating `\r` as a line end too.
fn spawn_line_reader<R: Read + Send + 'static>(source: R, tx: Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = [0u8; 4096];
        let mut pending: Vec<u8> = Vec::new();
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            for &b in &buf[..n] {
                if b == b'\n' || b == b'\r' {
                    if !flush_line(&mut pending, &tx) {
                        return;
                    }
                } else {
                    pending.push(b);
                }
            }
        }
        flush_line(&mut pending, &tx);
    });
}

/// Sends the pending bytes as one line. Returns false once the receiver is gone.
fn flush_line(pending: &mut Vec<u8>, tx: &Sender<String>) -> bool {
    if pending.is_empty() {
        return true;
    }
    let line = String::from_utf8_lossy(pending).trim_end().to_string();
    pending.clear();
    if line.is_empty() {
        return true;
    }
    tx.send(line).is_ok()
}

/// Built-in single connection fetch with resume.
fn http_fetch(
    locator: &str,
    path: &Path,
    cancel: &AtomicBool,
    lines: &Sender<String>,
) -> Result<u64, String> {
    use reqwest::StatusCode;
    use reqwest::header::RANGE;

    let client = reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(None)
        .user_agent(concat!("iaseek/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("cannot build http client: {}", e))?;

    let existing = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let mut request = client.get(locator);
    if existing > 0 {
        request = request.header(RANGE, format!("bytes={}-", existing));
    }

    let mut resp = request.send().map_err(|e| format!("request failed: {}", e))?;
    let status = resp.status();

    let (mut file, mut written) = if existing > 0 && status == StatusCode::PARTIAL_CONTENT {
        let _ = lines.send(format!("resuming at {}", format_file_size(existing)));
        (open_append(path).map_err(|e| io_reason(path, e))?, existing)
    } else if existing > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
        let _ = lines.send("already complete".to_string());
        return Ok(existing);
    } else if status.is_success() {
        (File::create(path).map_err(|e| io_reason(path, e))?, 0)
    } else {
        return Err(format!("server answered with status {}", status.as_u16()));
    };

    let total = resp.content_length().map(|len| len + written);
    let mut buf = vec![0u8; FETCH_BUFFER];
    let mut last_report = Instant::now();

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err("cancelled".into());
        }
        let n = resp.read(&mut buf).map_err(|e| format!("read failed: {}", e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(|e| io_reason(path, e))?;
        written += n as u64;

        if last_report.elapsed() >= PROGRESS_EVERY {
            let _ = lines.send(progress_line(written, total));
            last_report = Instant::now();
        }
    }

    file.flush().map_err(|e| io_reason(path, e))?;
    let _ = lines.send(progress_line(written, total));
    Ok(written)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).open(path)
}

fn io_reason(path: &Path, e: io::Error) -> String {
    format!("{}: {}", path.display(), e)
}

/// `12.3 MB / 40.0 MB (30%)`, or just the byte count when the total is unknown.
pub fn progress_line(done: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => format!(
            "{} / {} ({}%)",
            format_file_size(done),
            format_file_size(total),
            done.saturating_mul(100) / total
        ),
        _ => format_file_size(done),
    }
}
