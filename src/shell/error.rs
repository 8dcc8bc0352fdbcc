use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("fork has failed: {0}")]
    Fork(#[source] nix::Error),
    #[error("pipe has failed: {0}")]
    Pipe(#[source] nix::Error),
    #[error("{}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("argument contains an interior nul byte")]
    StringEncoding,
    #[error("malformed command: {0}")]
    Malformed(String),
    #[error("sigaction has failed: {0}")]
    Signal(#[source] nix::Error),
}

impl Error {
    /// Fork and pipe failures mean the process table or descriptor table is
    /// unusable, so the interpreter itself has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fork(_) | Error::Pipe(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn only_fork_and_pipe_are_fatal() {
        assert!(Error::Fork(Errno::EAGAIN).is_fatal());
        assert!(Error::Pipe(Errno::EMFILE).is_fatal());
        assert!(!Error::Malformed("|".into()).is_fatal());
        assert!(!Error::StringEncoding.is_fatal());
        assert!(!Error::Signal(Errno::EINVAL).is_fatal());
        let open = Error::Open {
            path: PathBuf::from("/nope/out"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!open.is_fatal());
    }

    #[test]
    fn open_error_names_the_path() {
        let open = Error::Open {
            path: PathBuf::from("/nope/out"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(open.to_string().starts_with("/nope/out: "));
    }
}
