use std::fs::File;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::path::{Path, PathBuf};

use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;

use super::super::dispatch::REDIRECT;
use super::super::error::Error;
use super::{Job, Status};

/// Removes a trailing `> path` pair from `args` and returns the path.
///
/// Matches only when there is a command left in front of the marker, i.e.
/// more than two tokens with the marker second-to-last.
pub fn split_target(args: &mut Vec<String>) -> Option<PathBuf> {
    let len = args.len();
    if len > 2 && args[len - 2].starts_with(REDIRECT) {
        let target = args.pop().map(PathBuf::from);
        args.pop();
        target
    } else {
        None
    }
}

/// A `>` left as the last token has nothing to redirect into.
pub fn reject_dangling_marker(args: &[String]) -> Result<(), Error> {
    match args.last() {
        Some(last) if last.starts_with(REDIRECT) => {
            Err(Error::Malformed(String::from("missing redirection target")))
        }
        _ => Ok(()),
    }
}

/// Opens a redirection target for writing, creating it `rw-rw-rw-` (less the
/// umask) when absent. Existing contents are not truncated.
pub fn open_target(path: &Path) -> Result<File, Error> {
    let mode = Mode::S_IRUSR
        | Mode::S_IWUSR
        | Mode::S_IRGRP
        | Mode::S_IWGRP
        | Mode::S_IROTH
        | Mode::S_IWOTH;
    match fcntl::open(path, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_CLOEXEC, mode) {
        Ok(fd) => Ok(unsafe { File::from_raw_fd(fd) }),
        Err(errno) => Err(Error::Open {
            path: path.to_path_buf(),
            source: io::Error::from(errno),
        }),
    }
}

/// `command args... > path`
#[derive(Debug)]
pub struct Redirection {
    job: Job,
    target: PathBuf,
}

impl Redirection {
    pub fn parse(mut args: Vec<String>) -> Result<Redirection, Error> {
        let target = split_target(&mut args)
            .ok_or_else(|| Error::Malformed(String::from("missing redirection target")))?;
        Ok(Redirection {
            job: Job::new(&args)?,
            target,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The target is opened before forking so an unusable path costs no
    /// process. The parent holds its copy until the child is done.
    pub fn run(&mut self) -> Result<Status, Error> {
        let file = open_target(&self.target)?;
        self.job.spawn(None, Some(file.as_raw_fd()), &[])?;
        let status = self.job.wait();
        drop(file);
        debug!("`{}` > {}: {:?}", self.job.program(), self.target().display(), status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn split_target_strips_marker_and_path() {
        let mut tokens = args(&["echo", "hi", ">", "out.txt"]);
        assert_eq!(split_target(&mut tokens), Some(PathBuf::from("out.txt")));
        assert_eq!(tokens, args(&["echo", "hi"]));

        let mut bare = args(&[">", "out.txt"]);
        assert_eq!(split_target(&mut bare), None);
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn output_lands_in_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut redirection =
            Redirection::parse(args(&["echo", "hello", ">", out.to_str().unwrap()])).unwrap();
        assert_eq!(redirection.target(), out.as_path());
        assert_eq!(redirection.run().unwrap(), Status::Exited(0));
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");
    }

    #[test]
    fn existing_file_is_written_from_the_start_without_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::write(&out, "0123456789\n").unwrap();
        let mut redirection =
            Redirection::parse(args(&["echo", "ab", ">", out.to_str().unwrap()])).unwrap();
        redirection.run().unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "ab\n3456789\n");
    }

    #[test]
    fn unopenable_target_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("out");
        let mut redirection =
            Redirection::parse(args(&["echo", "hello", ">", out.to_str().unwrap()])).unwrap();
        assert!(matches!(redirection.run(), Err(Error::Open { .. })));
        assert_eq!(redirection.job.status(), Status::NotStarted);
    }

    #[test]
    fn dangling_marker_is_rejected() {
        assert!(matches!(
            reject_dangling_marker(&args(&["cat", ">"])),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            reject_dangling_marker(&args(&["cat", ">>"])),
            Err(Error::Malformed(_))
        ));
        assert!(reject_dangling_marker(&args(&["cat", "a>"])).is_ok());
        assert!(reject_dangling_marker(&[]).is_ok());
    }

    #[test]
    fn created_target_is_readable_and_writable_by_owner() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fresh");
        drop(open_target(&out).unwrap());
        let mode = fs::metadata(&out).unwrap().permissions().mode();
        assert_eq!(mode & 0o600, 0o600);
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn marker_without_command_is_malformed() {
        assert!(matches!(
            Redirection::parse(args(&["echo"])),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            Redirection::parse(args(&["|", ">", "out"])),
            Err(Error::Malformed(_))
        ));
    }
}
