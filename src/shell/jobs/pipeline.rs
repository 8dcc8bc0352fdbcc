use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::unistd;

use super::super::error::Error;
use super::redirect;
use super::{Job, Status};

/// `writer args... | reader args... [> path]`
#[derive(Debug)]
pub struct Pipeline {
    writer: Job,
    reader: Job,
    output: Option<PathBuf>,
}

impl Pipeline {
    /// Splits `args` at the pipe marker found at index `at`.
    pub fn parse(mut args: Vec<String>, at: usize) -> Result<Pipeline, Error> {
        let mut right = args.split_off(at + 1);
        args.truncate(at);
        if right.is_empty() {
            return Err(Error::Malformed(String::from("missing command after `|`")));
        }
        let output = redirect::split_target(&mut right);
        redirect::reject_dangling_marker(&right)?;
        Ok(Pipeline {
            writer: Job::new(&args)?,
            reader: Job::new(&right)?,
            output,
        })
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Runs both sides and waits for the writer, then the reader. Returns the
    /// reader's status.
    ///
    /// The pipe exists before either fork so both children inherit it. Each
    /// child keeps only its own end, and the parent drops the write end as
    /// soon as the writer is forked so the reader sees end-of-file when the
    /// writer exits.
    pub fn run(&mut self) -> Result<Status, Error> {
        let output = match self.output {
            Some(ref path) => Some(redirect::open_target(path)?),
            None => None,
        };
        let (read_end, write_end) = unistd::pipe().map_err(Error::Pipe)?;

        let mut writer_close = vec![read_end.as_raw_fd()];
        writer_close.extend(output.as_ref().map(File::as_raw_fd));
        self.writer
            .spawn(None, Some(write_end.as_raw_fd()), &writer_close)?;
        drop(write_end);

        self.reader.spawn(
            Some(read_end.as_raw_fd()),
            output.as_ref().map(File::as_raw_fd),
            &[],
        )?;
        drop(read_end);

        let first = self.writer.wait();
        let second = self.reader.wait();
        debug!(
            "pipeline `{}` | `{}` (output {:?}) finished: {:?}, {:?}",
            self.writer.program(),
            self.reader.program(),
            self.output(),
            first,
            second
        );
        Ok(second)
    }
}
