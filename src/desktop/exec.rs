//! `Exec` command lines
//!
//! Splits an `Exec` value into arguments following the desktop entry
//! quoting rules and expands the field codes:
//!
//! | code      | expansion                                         |
//! |-----------|---------------------------------------------------|
//! | `%f` `%F` | parameters, `file:` URIs converted to local paths |
//! | `%u` `%U` | parameters as given                               |
//! | `%i`      | `--icon <Icon>` when the entry has an icon         |
//! | `%c`      | the entry name                                    |
//! | `%k`      | the entry file path                               |
//! | `%%`      | a literal `%`                                     |
//!
//! Deprecated codes (`%d %D %n %N %v %m`) expand to nothing.

use url::Url;

use super::entry::DesktopEntry;

/// Split an `Exec` value into arguments.
///
/// Returns `None` for an unterminated quote.
pub fn split_exec(exec: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_arg = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => match chars.next()? {
                            escaped @ ('"' | '`' | '$' | '\\') => current.push(escaped),
                            other => {
                                current.push('\\');
                                current.push(other);
                            }
                        },
                        other => current.push(other),
                    }
                }
            }
            ' ' | '\t' => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            other => {
                in_arg = true;
                current.push(other);
            }
        }
    }

    if in_arg {
        args.push(current);
    }
    Some(args)
}

/// Local path for `file:` URIs, the parameter itself otherwise
pub fn to_local_path(param: &str) -> String {
    Url::parse(param)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| param.to_string())
}

fn has_param_code(args: &[String]) -> bool {
    args.iter().any(|arg| {
        let mut chars = arg.chars();
        while let Some(c) = chars.next() {
            if c == '%' {
                match chars.next() {
                    Some('f' | 'F' | 'u' | 'U') => return true,
                    _ => continue,
                }
            }
        }
        false
    })
}

/// Build the command line for `entry` with `params`.
///
/// A command without any parameter field code gets the parameters
/// appended. Returns `None` when the entry has no usable `Exec`.
pub fn expand_exec(entry: &DesktopEntry, params: &[String]) -> Option<Vec<String>> {
    let args = split_exec(entry.exec()?)?;
    let wants_params = has_param_code(&args);
    let mut result = Vec::with_capacity(args.len() + params.len());

    for arg in &args {
        match arg.as_str() {
            "%F" => result.extend(params.iter().map(|p| to_local_path(p))),
            "%U" => result.extend(params.iter().cloned()),
            "%i" => {
                if let Some(icon) = entry.icon() {
                    result.push("--icon".to_string());
                    result.push(icon.to_string());
                }
            }
            _ => {
                if let Some(expanded) = expand_inline(arg, entry, params) {
                    result.push(expanded);
                }
            }
        }
    }

    if !wants_params {
        result.extend(params.iter().cloned());
    }

    if result.is_empty() {
        return None;
    }
    Some(result)
}

/// Expand the codes inside a single argument. An argument consisting only
/// of a code that expands to nothing is dropped.
fn expand_inline(arg: &str, entry: &DesktopEntry, params: &[String]) -> Option<String> {
    if !arg.contains('%') {
        return Some(arg.to_string());
    }

    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('f') | Some('F') => {
                if let Some(first) = params.first() {
                    out.push_str(&to_local_path(first));
                }
            }
            Some('u') | Some('U') => {
                if let Some(first) = params.first() {
                    out.push_str(first);
                }
            }
            Some('c') => out.push_str(entry.name().unwrap_or_default()),
            Some('k') => out.push_str(&entry.path().to_string_lossy()),
            Some('i') => {
                if let Some(icon) = entry.icon() {
                    out.push_str(icon);
                }
            }
            // Deprecated and unknown codes
            Some(_) | None => {}
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
