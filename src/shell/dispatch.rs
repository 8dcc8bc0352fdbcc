//! Classifies a token sequence into one of the four command forms.

pub const BACKGROUND: char = '&';
pub const PIPE: char = '|';
pub const REDIRECT: char = '>';

/// A token is a control marker when its first character is one.
pub fn is_control(token: &str) -> bool {
    token.starts_with(BACKGROUND) || token.starts_with(PIPE) || token.starts_with(REDIRECT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// Trailing `&`.
    Background,
    /// Split at the first `|`, whose index this is.
    Pipe(usize),
    /// `>` as the second-to-last token, destination last.
    Redirect,
    Foreground,
}

/// First match wins: background, then pipe, then redirection.
pub fn classify<S: AsRef<str>>(args: &[S]) -> Form {
    let len = args.len();
    if let Some(last) = args.last() {
        if last.as_ref().starts_with(BACKGROUND) {
            return Form::Background;
        }
    }
    if let Some(at) = args.iter().position(|arg| arg.as_ref().starts_with(PIPE)) {
        return Form::Pipe(at);
    }
    if len > 2 && args[len - 2].as_ref().starts_with(REDIRECT) {
        return Form::Redirect;
    }
    Form::Foreground
}
