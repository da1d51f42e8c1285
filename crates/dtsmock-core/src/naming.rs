//! Identifier helpers shared by the synthesizer and the index builder.

/// `batteryInfo` -> `BatteryInfo`
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the factory function generated for a module or file.
pub fn factory_name(name: &str) -> String {
    format!("mock{}", upper_first(&sanitize_ident(name)))
}

/// Join `_`-separated segments, capitalizing every segment after the first.
///
/// `ohos_multimedia_image` -> `ohosMultimediaImage`
pub fn camel_join(file_name: &str) -> String {
    let mut segments = file_name.split('_').filter(|s| !s.is_empty());
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        out.push_str(&upper_first(segment));
    }
    out
}

/// Replace every character that cannot appear in a JS identifier with `_`.
pub fn sanitize_ident(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Is this a single uppercase letter, i.e. an unbound generic parameter?
pub fn is_generic_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

pub fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_lowercase())
}

/// Quote a string as a single-quoted JS literal.
pub fn js_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
