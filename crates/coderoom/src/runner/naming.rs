//! Source file naming for languages that tie the file name to its contents

use std::sync::LazyLock;

use regex::Regex;

static PUBLIC_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bpublic\s+(?:(?:final|abstract|static|sealed|strictfp)\s+)*(?:class|interface|enum|record)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
    )
    .expect("public type pattern is valid")
});

/// Name of the first public top-level type declared in `code`.
///
/// Declarations mentioned inside `//` or `/* */` comments are skipped.
pub fn public_class_name(code: &str) -> Option<&str> {
    PUBLIC_TYPE
        .captures_iter(code)
        .find(|captures| {
            captures
                .get(0)
                .is_some_and(|decl| !in_comment(&code[..decl.start()]))
        })
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Whether the end of `before` lies inside a comment
fn in_comment(before: &str) -> bool {
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    if before[line_start..].contains("//") {
        return true;
    }
    match (before.rfind("/*"), before.rfind("*/")) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}
