//! Reads single values out of a `document.cookie` style string.

use crate::query::decode_component;

/// Looks up cookie `name` in a `k1=v1; k2=v2` string. Entries are trimmed and
/// must start with exactly `name=`; the value is percent-decoded.
pub fn read_cookie(cookie_string: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    cookie_string
        .split(';')
        .map(str::trim)
        .find_map(|entry| {
            entry
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(|value| decode_component(value).into_owned())
}
