//! Package backend driving the system package manager through configured
//! command templates. Each operation runs on its own worker thread and
//! reports through its `OperationSettler`.

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::CommandTemplates;
use crate::error::OperationError;
use crate::operation::{OperationHandle, OperationSettler, PackageBackend, StageProgress};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(500);

pub struct CommandBackend {
    commands: CommandTemplates,
}

impl CommandBackend {
    pub fn new(commands: CommandTemplates) -> Self {
        Self { commands }
    }
}

impl PackageBackend for CommandBackend {
    fn install(&self, pkgname: &str) -> OperationHandle {
        let argv = self.commands.install.render(&[pkgname]);
        spawn_operation("install", move |settler| {
            run_command("install", &argv, &mut settler.stage(0, 100))
        })
    }

    fn remove(&self, file: &Path) -> OperationHandle {
        let target = file.to_string_lossy().into_owned();
        let argv = self.commands.remove.render(&[&target]);
        spawn_operation("remove", move |settler| {
            run_command("remove", &argv, &mut settler.stage(0, 100))
        })
    }

    fn refresh(
        &self,
        origin_files: &[PathBuf],
        config_packages: &[String],
        data_packages: &[String],
    ) -> OperationHandle {
        let origins: Vec<String> = origin_files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let origins: Vec<&str> = origins.iter().map(String::as_str).collect();
        let refresh_argv = self.commands.refresh.render(&origins);
        let packages: Vec<&str> = config_packages
            .iter()
            .chain(data_packages.iter())
            .map(String::as_str)
            .collect();
        let install_argv = if packages.is_empty() {
            None
        } else {
            Some(self.commands.install.render(&packages))
        };
        debug!(origins = origins.len(), "refreshing application metadata");
        spawn_operation("refresh", move |settler| {
            refresh_stages(&refresh_argv, install_argv.as_deref(), settler)
        })
    }
}

/// Refresh the package metadata, then make sure the appstream packages are
/// installed. Progress is split evenly when both stages run.
fn refresh_stages(
    refresh_argv: &[String],
    install_argv: Option<&[String]>,
    settler: &OperationSettler,
) -> Result<(), OperationError> {
    let Some(install_argv) = install_argv else {
        return run_command("refresh", refresh_argv, &mut settler.stage(0, 100));
    };
    run_command("refresh", refresh_argv, &mut settler.stage(0, 50))?;
    run_command("refresh", install_argv, &mut settler.stage(50, 50))
}

/// Run `job` on a worker thread and hand back the UI side of the operation.
pub fn spawn_operation<F>(label: &'static str, job: F) -> OperationHandle
where
    F: FnOnce(&OperationSettler) -> Result<(), OperationError> + Send + 'static,
{
    let (handle, settler) = OperationHandle::channel();
    thread::spawn(move || {
        info!(operation = label, "operation started");
        let result = job(&settler);
        match &result {
            Ok(()) => info!(operation = label, "operation finished"),
            Err(e) => warn!(operation = label, "operation failed: {e}"),
        }
        settler.settle(result);
    });
    handle
}

/// Line of child output, tagged by stream.
enum Output {
    Stdout(String),
    Stderr(String),
}

/// The parts of a running child the supervision loop needs.
trait ChildProcess {
    fn kill(&mut self) -> io::Result<()>;
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl ChildProcess for Child {
    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Run one package manager command, streaming stdout lines as progress and
/// killing the child when cancellation is requested.
fn run_command(
    label: &'static str,
    argv: &[String],
    progress: &mut StageProgress<'_>,
) -> Result<(), OperationError> {
    let (program, args) = argv
        .split_first()
        .ok_or(OperationError::EmptyCommand(label))?;

    progress.report(None, None, false);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OperationError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

    // the channel disconnects once both readers hit EOF
    let (tx, output) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone(), Output::Stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx.clone(), Output::Stderr);
    }
    drop(tx);

    supervise(program, &mut child, &output, progress)
}

fn forward_lines<R>(reader: R, tx: mpsc::Sender<Output>, tag: fn(String) -> Output)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            if tx.send(tag(line)).is_err() {
                break;
            }
        }
    });
}

/// Poll the child until it exits or cancellation succeeds.
///
/// A kill the OS refuses (e.g. a privileged child) leaves the command
/// running; the operation then settles with its real exit status.
fn supervise(
    program: &str,
    child: &mut dyn ChildProcess,
    output: &mpsc::Receiver<Output>,
    progress: &mut StageProgress<'_>,
) -> Result<(), OperationError> {
    let mut last_stderr = None;
    let mut kill_refused = false;

    loop {
        for out in output.try_iter() {
            handle_output(progress, &mut last_stderr, out);
        }

        if let Some(status) = child.try_wait()? {
            drain_after_exit(output, progress, &mut last_stderr);
            if status.success() {
                return Ok(());
            }
            return Err(OperationError::Failed(failure_text(
                last_stderr.as_deref(),
                &status.to_string(),
            )));
        }

        if !kill_refused && progress.is_cancelled() {
            match child.kill() {
                Ok(()) => {
                    debug!(program = %program, "cancellation requested, child killed");
                    child.wait()?;
                    return Err(OperationError::Cancelled);
                }
                Err(e) => {
                    warn!(program = %program, "cannot cancel: {e}");
                    kill_refused = true;
                    progress.report(None, Some(format!("Cannot cancel: {e}")), false);
                }
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Collect output still buffered after exit. Descendants that inherited the
/// pipes can keep them open indefinitely, so this gives up after
/// `EXIT_DRAIN_GRACE`.
fn drain_after_exit(
    output: &mpsc::Receiver<Output>,
    progress: &mut StageProgress<'_>,
    last_stderr: &mut Option<String>,
) {
    let deadline = Instant::now() + EXIT_DRAIN_GRACE;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match output.recv_timeout(left) {
            Ok(out) => handle_output(progress, last_stderr, out),
            Err(RecvTimeoutError::Timeout) => {
                debug!("output still open after exit, not waiting for it");
                return;
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn handle_output(progress: &mut StageProgress<'_>, last_stderr: &mut Option<String>, out: Output) {
    match out {
        Output::Stdout(line) => report_line(progress, &line),
        Output::Stderr(line) => {
            let line = line.trim();
            if !line.is_empty() {
                *last_stderr = Some(line.to_string());
            }
        }
    }
}

fn report_line(progress: &mut StageProgress<'_>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    progress.report(
        parse_percentage(line),
        Some(line.to_string()),
        is_waiting_line(line),
    );
}

/// Last `NN%` token on the line, if it is a valid percentage.
pub fn parse_percentage(line: &str) -> Option<u8> {
    line.split(|c: char| c.is_whitespace() || c == '[' || c == ']' || c == '(' || c == ')')
        .filter_map(|tok| tok.strip_suffix('%'))
        .filter_map(|num| num.parse::<u8>().ok())
        .filter(|p| *p <= 100)
        .last()
}

pub fn is_waiting_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("waiting for") || lower.contains("waiting on")
}

/// Last non-empty stderr line, or the exit status when stderr was silent.
pub fn failure_text(last_stderr: Option<&str>, status: &str) -> String {
    match last_stderr {
        Some(line) => line.to_string(),
        None => format!("command failed ({status})"),
    }
}
