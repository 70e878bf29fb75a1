use std::collections::HashMap;

/// Parse a `Cookie` header value into name/value pairs. Values are
/// percent-decoded; pairs without `=` are ignored and the first occurrence
/// of a name wins.
pub fn parse_cookie(raw: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for part in raw.split(';') {
        let Some((name, value)) = part.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"');
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        pairs.entry(name.to_string()).or_insert(value);
    }
    pairs
}

/// The reader id carried in the `wr_vid` cookie
pub fn reader_id(raw: &str) -> Option<String> {
    parse_cookie(raw)
        .remove("wr_vid")
        .filter(|vid| !vid.is_empty())
}
