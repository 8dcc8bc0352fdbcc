use super::dispatch::{self, Form};
use super::error::Error;
use super::jobs::pipeline::Pipeline;
use super::jobs::redirect::{self, Redirection};
use super::jobs::{Job, Status};
use super::signals::SignalPolicy;

/// Interpreter state that outlives a single command line: the signal policy
/// and the background jobs that have not been collected yet.
pub struct ShellState {
    policy: SignalPolicy,
    background: Vec<Job>,
}

impl ShellState {
    pub fn new() -> Self {
        ShellState {
            policy: SignalPolicy::interpreter(),
            background: Vec::new(),
        }
    }

    /// One-time setup before the first command.
    pub fn prepare(&self) -> Result<(), Error> {
        self.policy.install()
    }

    /// One-time teardown. Outstanding background jobs are left running.
    pub fn finalize(&mut self) {
        self.reap_background();
        if self.background_jobs() > 0 {
            debug!("leaving {} background job(s) behind", self.background_jobs());
        }
    }

    /// Runs one tokenized command line.
    ///
    /// Per-command failures are reported on stderr and swallowed; only fork
    /// and pipe failures come back as `Err`, and those end the interpreter.
    pub fn process_arglist(&mut self, args: Vec<String>) -> Result<(), Error> {
        self.reap_background();
        match self.dispatch(args) {
            Ok(status) => {
                debug!("command finished: {:?}", status);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                eprintln!("forksh: {}", e);
                Ok(())
            }
        }
    }

    /// Routes `args` to exactly one handler and returns the status of the
    /// last process it waited for (or the running background job).
    pub fn dispatch(&mut self, mut args: Vec<String>) -> Result<Status, Error> {
        let form = dispatch::classify(&args);
        trace!("{:?} classified as {:?}", args, form);
        match form {
            Form::Background => {
                args.pop();
                redirect::reject_dangling_marker(&args)?;
                self.run_background(&args)
            }
            Form::Pipe(at) => Pipeline::parse(args, at)?.run(),
            Form::Redirect => Redirection::parse(args)?.run(),
            Form::Foreground => {
                redirect::reject_dangling_marker(&args)?;
                Job::new(&args)?.run()
            }
        }
    }

    fn run_background(&mut self, args: &[String]) -> Result<Status, Error> {
        let mut job = Job::new(args)?;
        job.spawn(None, None, &[])?;
        let status = job.status();
        self.background.push(job);
        Ok(status)
    }

    /// Collects background jobs that already finished. Never blocks.
    pub fn reap_background(&mut self) -> usize {
        let before = self.background.len();
        self.background.retain_mut(|job| {
            let status = job.poll();
            if status.is_finished() {
                debug!("background `{}` done: {:?}", job.program(), status);
                false
            } else {
                true
            }
        });
        before - self.background.len()
    }

    pub fn background_jobs(&self) -> usize {
        self.background.len()
    }
}
