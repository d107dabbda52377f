//! Search filter construction.

/// `(<attribute>=<escaped value>)`, AND-ed with `base` when one is set.
pub fn equality(base: Option<&str>, attribute: &str, value: &str) -> String {
    let clause = format!("({attribute}={})", escape_ldap(value));

    match base.map(str::trim).filter(|base| !base.is_empty()) {
        Some(base) if base.starts_with('(') => format!("(&{base}{clause})"),
        Some(base) => format!("(&({base}){clause})"),
        None => clause,
    }
}

/// Escape a value for use in a filter (RFC 4515).
///
/// Non-ASCII bytes are hex-escaped as well.
pub fn escape_ldap(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.as_bytes() {
        match *b {
            b'*' => out.push_str(r"\2a"),
            b'(' => out.push_str(r"\28"),
            b')' => out.push_str(r"\29"),
            b'\\' => out.push_str(r"\5c"),
            0 => out.push_str(r"\00"),
            c if c.is_ascii() => out.push(c as char),
            c => out.push_str(&format!(r"\{c:02x}")),
        }
    }
    out
}
