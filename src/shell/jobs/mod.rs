pub mod pipeline;
pub mod redirect;

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use super::dispatch::is_control;
use super::error::Error;
use super::signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    Running(Pid),
    Stopped(Pid),
    Exited(i32),
    Signaled(Signal),
    /// Collected by someone else; the exit status is unknown.
    Lost,
}

impl Status {
    pub fn is_finished(&self) -> bool {
        matches!(self, Status::Exited(_) | Status::Signaled(_) | Status::Lost)
    }
}

/// One program plus its arguments, ready to be forked and exec'd.
///
/// The `CString` argument vector and the failure message prefix are built
/// before `fork`. The only allocation left in the child is the pointer array
/// `execvp` assembles on its way into the kernel.
#[derive(Debug)]
pub struct Job {
    program: String,
    argv: Vec<CString>,
    failure_prefix: Vec<u8>,
    status: Status,
}

impl Job {
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<Job, Error> {
        let program = match args.first().map(|s| s.as_ref()) {
            Some(name) if !name.is_empty() && !is_control(name) => name.to_string(),
            Some(name) => return Err(Error::Malformed(format!("unexpected `{}`", name))),
            None => return Err(Error::Malformed(String::from("missing command"))),
        };
        let argv = args
            .iter()
            .map(|arg| CString::new(arg.as_ref()).map_err(|_| Error::StringEncoding))
            .collect::<Result<Vec<_>, _>>()?;
        let failure_prefix = format!("{}: ", program).into_bytes();
        Ok(Job {
            program,
            argv,
            failure_prefix,
            status: Status::NotStarted,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Runs the job in the foreground: fork, exec, wait.
    pub fn run(&mut self) -> Result<Status, Error> {
        self.spawn(None, None, &[])?;
        Ok(self.wait())
    }

    /// Forks a child that installs `stdin`/`stdout` (when given) as its
    /// standard streams and then replaces itself with the program.
    ///
    /// The child closes every descriptor in `post_fork_close` first; this is
    /// where the end of a pipe it does not use goes.
    pub fn spawn(
        &mut self,
        stdin: Option<RawFd>,
        stdout: Option<RawFd>,
        post_fork_close: &[RawFd],
    ) -> Result<Pid, Error> {
        match unsafe { unistd::fork() }.map_err(Error::Fork)? {
            ForkResult::Parent { child } => {
                debug!("spawned `{}` as pid {}", self.program, child);
                self.status = Status::Running(child);
                Ok(child)
            }
            ForkResult::Child => self.exec_child(stdin, stdout, post_fork_close),
        }
    }

    fn exec_child(&self, stdin: Option<RawFd>, stdout: Option<RawFd>, post_fork_close: &[RawFd]) -> ! {
        for fd in post_fork_close {
            let _ = unistd::close(*fd);
        }
        let _ = signals::restore_default_interrupt();
        if let Some(fd) = stdin {
            install_stream(fd, libc::STDIN_FILENO);
        }
        if let Some(fd) = stdout {
            install_stream(fd, libc::STDOUT_FILENO);
        }
        let errno = match unistd::execvp(&self.argv[0], &self.argv) {
            Err(errno) => errno,
            Ok(never) => match never {},
        };
        let stderr = io::stderr();
        let _ = unistd::write(&stderr, &self.failure_prefix);
        let _ = unistd::write(&stderr, errno.desc().as_bytes());
        let _ = unistd::write(&stderr, b"\n");
        unsafe { libc::_exit(1) }
    }

    /// Blocks until the child exits, is killed, or is stopped.
    pub fn wait(&mut self) -> Status {
        let pid = match self.status {
            Status::Running(pid) => pid,
            other => return other,
        };
        loop {
            match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
                Ok(status) => {
                    if self.record(status) {
                        break;
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => {
                    debug!("pid {} was already collected", pid);
                    self.status = Status::Lost;
                    break;
                }
                Err(e) => {
                    warn!("waitpid({}) failed: {}", pid, e);
                    break;
                }
            }
        }
        self.status
    }

    /// Collects the child if it already finished; never blocks.
    pub fn poll(&mut self) -> Status {
        if let Status::Running(pid) = self.status {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(status) => {
                    self.record(status);
                }
                Err(Errno::ECHILD) => self.status = Status::Lost,
                Err(e) => warn!("waitpid({}) failed: {}", pid, e),
            }
        }
        self.status
    }

    fn record(&mut self, status: WaitStatus) -> bool {
        match status {
            WaitStatus::Exited(_, code) => self.status = Status::Exited(code),
            WaitStatus::Signaled(_, signal, _) => self.status = Status::Signaled(signal),
            WaitStatus::Stopped(pid, _) => self.status = Status::Stopped(pid),
            _ => return false,
        }
        true
    }
}

/// Makes `fd` the descriptor `stream` and drops the original. Only the
/// interrupted and no-child conditions are let through; any other `dup2`
/// failure ends the child before it can run with the wrong output.
fn install_stream(fd: RawFd, stream: RawFd) {
    if fd == stream {
        return;
    }
    match unistd::dup2(fd, stream) {
        Ok(_) | Err(Errno::EINTR) | Err(Errno::ECHILD) => {}
        Err(_) => unsafe { libc::_exit(1) },
    }
    let _ = unistd::close(fd);
}
