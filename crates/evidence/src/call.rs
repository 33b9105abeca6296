//! Token extraction from raw call signatures.
//!
//! A call signature looks like `java.util.ArrayList.add(java.lang.Object)`:
//! a dotted qualifier ending in the method name, followed by a parenthesized,
//! comma-separated argument type list.

/// Qualifier part of a signature (everything before the first `(`).
fn qualifier(call: &str) -> &str {
    call.split_once('(').map_or(call, |(head, _)| head)
}

/// Method name of the call, or nothing for constructors (`Foo.Foo(..)`).
#[must_use]
pub fn apicalls_from(call: &str) -> Vec<String> {
    let mut segments = qualifier(call).rsplit('.');
    let name = segments.next().unwrap_or_default();
    if name.is_empty() {
        return Vec::new();
    }
    match segments.next() {
        Some(class) if class == name => Vec::new(),
        _ => vec![name.to_string()],
    }
}

/// Up to two capitalized qualifier segments, outer first, innermost last.
#[must_use]
pub fn types_from(call: &str) -> Vec<String> {
    let owner = qualifier(call)
        .rsplit_once('.')
        .map_or("", |(owner, _method)| owner);

    let capitalized: Vec<&str> = owner
        .split('.')
        .filter(|segment| segment.chars().next().is_some_and(char::is_uppercase))
        .collect();

    match capitalized.as_slice() {
        [] => Vec::new(),
        [only] => vec![(*only).to_string()],
        [.., outer, inner] => vec![(*outer).to_string(), (*inner).to_string()],
    }
}

/// Simple names of the argument types, with generics and array markers removed.
#[must_use]
pub fn context_from(call: &str) -> Vec<String> {
    let Some((_, rest)) = call.split_once('(') else {
        return Vec::new();
    };
    let args = rest.split(['(', ')']).next().unwrap_or_default();

    args.split(',')
        .map(|arg| {
            let simple = arg.rsplit('.').next().unwrap_or_default();
            let simple = simple.split('<').next().unwrap_or_default();
            simple.replace("[]", "")
        })
        .filter(|arg| !arg.is_empty())
        .collect()
}
