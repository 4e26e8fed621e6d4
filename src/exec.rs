use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// Outcome of one external command invocation. This is the whole contract
/// probes and fixes see: a command either succeeded or it did not, and the
/// combined stdout+stderr text is all the data there is.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub success: bool,
    pub timed_out: bool,
    pub output: String,
}

impl ExecOutput {
    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            timed_out: false,
            output: detail.into(),
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self {
            success: false,
            timed_out: true,
            output: format!("command timed out after {}s", timeout.as_secs()),
        }
    }
}

/// Capability to run external commands. Injected into probes and the fix
/// dispatcher so tests can script outputs and count invocations.
///
/// Implementations never return an error: a missing binary, non-zero exit
/// or timeout all come back as `success = false` with diagnostic text.
pub trait Runner {
    fn run(&self, cmd: &str, args: &[&str], timeout: Duration) -> ExecOutput;

    /// Whether a binary is resolvable on PATH.
    fn have(&self, cmd: &str) -> bool {
        self.run("which", &[cmd], Duration::from_secs(5)).success
    }
}

/// Exit 0 on Ctrl+C instead of the default fatal-signal termination, so
/// interrupting a menu or a running category reads as a clean quit.
pub fn install_interrupt_handler() {
    extern "C" fn exit_cleanly(_: nix::libc::c_int) {
        std::process::exit(0);
    }
    unsafe {
        let _ = nix::sys::signal::signal(
            nix::sys::signal::Signal::SIGINT,
            nix::sys::signal::SigHandler::Handler(exit_cleanly),
        );
    }
}

/// Production runner: spawns the process, waits with a bound, kills on
/// timeout, captures stdout and stderr combined.
pub struct SystemRunner;

/// Drain a pipe on its own thread so a chatty child cannot block on a
/// full pipe buffer while we wait for it to exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

impl Runner for SystemRunner {
    fn run(&self, cmd: &str, args: &[&str], timeout: Duration) -> ExecOutput {
        let mut child = match Command::new(cmd)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ExecOutput::failure(format!("failed to run {}: {}", cmd, e)),
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout.join();
                let _ = stderr.join();
                return ExecOutput::timeout(timeout);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout.join();
                let _ = stderr.join();
                return ExecOutput::failure(format!("failed waiting for {}: {}", cmd, e));
            }
        };

        let mut output = stdout.join().unwrap_or_default();
        output.push_str(&stderr.join().unwrap_or_default());

        ExecOutput {
            success: status.success(),
            timed_out: false,
            output,
        }
    }
}

/// Test runner with canned responses keyed on the full command line.
/// Unknown commands fail, mirroring a missing binary. Invocations are
/// recorded so tests can assert on them (including asserting zero).
#[derive(Default)]
pub struct ScriptedRunner {
    responses: std::collections::HashMap<String, ExecOutput>,
    pub calls: std::cell::RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(cmd: &str, args: &[&str]) -> String {
        if args.is_empty() {
            cmd.to_string()
        } else {
            format!("{} {}", cmd, args.join(" "))
        }
    }

    pub fn respond(mut self, cmdline: &str, success: bool, output: &str) -> Self {
        self.responses.insert(
            cmdline.to_string(),
            ExecOutput {
                success,
                timed_out: false,
                output: output.to_string(),
            },
        );
        self
    }

    pub fn respond_timeout(mut self, cmdline: &str) -> Self {
        self.responses.insert(
            cmdline.to_string(),
            ExecOutput::timeout(Duration::from_secs(10)),
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, cmd: &str, args: &[&str], _timeout: Duration) -> ExecOutput {
        let key = Self::key(cmd, args);
        self.calls.borrow_mut().push(key.clone());
        match self.responses.get(&key) {
            Some(out) => out.clone(),
            None => ExecOutput::failure(format!("failed to run {}: not scripted", cmd)),
        }
    }

    fn have(&self, cmd: &str) -> bool {
        let key = Self::key("which", &[cmd]);
        self.calls.borrow_mut().push(key.clone());
        self.responses.get(&key).map(|o| o.success).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_failure_not_panic() {
        let out = SystemRunner.run(
            "definitely-not-a-real-binary-xyz",
            &[],
            Duration::from_secs(1),
        );
        assert!(!out.success);
        assert!(!out.timed_out);
        assert!(out.output.contains("failed to run"));
    }

    #[test]
    fn test_nonzero_exit_is_failure_with_output() {
        let out = SystemRunner.run("sh", &["-c", "echo oops >&2; exit 3"], Duration::from_secs(5));
        assert!(!out.success);
        assert!(out.output.contains("oops"));
    }

    #[test]
    fn test_combined_output_capture() {
        let out = SystemRunner.run("sh", &["-c", "echo out; echo err >&2"], Duration::from_secs(5));
        assert!(out.success);
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[test]
    fn test_scripted_runner_records_calls() {
        let runner = ScriptedRunner::new().respond("systemctl is-active firewalld", true, "active");
        let out = runner.run("systemctl", &["is-active", "firewalld"], Duration::from_secs(10));
        assert!(out.success);
        assert_eq!(runner.call_count(), 1);

        let out = runner.run("lspci", &[], Duration::from_secs(10));
        assert!(!out.success);
        assert_eq!(runner.call_count(), 2);
    }
}
