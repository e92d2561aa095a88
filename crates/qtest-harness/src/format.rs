//! Runtime rendering of lifecycle messages.

use crate::arg::Arg;

const MISSING: &str = "<missing>";

/// Joins the arguments with single spaces.
///
/// ```
/// use qtest_harness::{args, render_args};
///
/// assert_eq!(render_args(&args!["took", 3_u32, "tries"]), "took 3 tries");
/// ```
#[must_use]
pub fn render_args(args: &[Arg]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fills `{}` placeholders in `format` with the arguments, in order.
///
/// `{{` and `}}` render literal braces. A placeholder without a matching
/// argument renders as `<missing>`; surplus arguments are appended after a
/// space.
///
/// ```
/// use qtest_harness::{args, render_format};
///
/// assert_eq!(render_format("{} of {}", &args![1, 2]), "1 of 2");
/// assert_eq!(render_format("{{{}}}", &args!["x"]), "{x}");
/// assert_eq!(render_format("{}", &args![1, 2]), "1 2");
/// ```
#[must_use]
pub fn render_format(format: &str, args: &[Arg]) -> String {
    let mut rendered = String::with_capacity(format.len());
    let mut remaining = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        let next = chars.peek().copied();
        match (ch, next) {
            ('{', Some('{')) => {
                chars.next();
                rendered.push('{');
            }
            ('{', Some('}')) => {
                chars.next();
                match remaining.next() {
                    Some(arg) => rendered.push_str(&arg.to_string()),
                    None => rendered.push_str(MISSING),
                }
            }
            ('}', Some('}')) => {
                chars.next();
                rendered.push('}');
            }
            (other, _) => rendered.push(other),
        }
    }

    let surplus: Vec<String> = remaining.map(ToString::to_string).collect();
    if !surplus.is_empty() {
        rendered.push(' ');
        rendered.push_str(&surplus.join(" "));
    }
    rendered
}
