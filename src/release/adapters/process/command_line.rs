//! Command-line helpers shared by the process adapters.
//!
//! Arguments arrive as one free-form string and are split with quote
//! awareness; rendered command lines use POSIX shell quoting so goal output
//! records exactly what ran.

/// Escapes a value for safe inclusion in a POSIX shell command.
///
/// Uses single-quote wrapping and the standard `'\''` sequence for embedded
/// quotes.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// Renders a program and its arguments as a shell-quoted command line.
#[must_use]
pub fn render_command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = shell_escape(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_escape(arg.as_ref()));
    }
    line
}

/// Splits a free-form argument string on whitespace, keeping quoted runs
/// together and dropping the quotes.
///
/// `-Dx=1 "-Dmaven.repo.local=/tmp/my repo"` yields two arguments.
#[must_use]
pub fn split_arguments(arguments: &str) -> Vec<String> {
    let mut parsed = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in arguments.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    parsed.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }
    if in_token {
        parsed.push(current);
    }
    parsed
}
