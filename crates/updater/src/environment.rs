//! Build environment variables and `$VAR` / `${VAR}` template expansion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Snapshot of the variables visible to one step execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnvironment {
    vars: BTreeMap<String, String>,
}

impl BuildEnvironment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Returns the value of `name`, if defined.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Replaces variable references in `template` with their values.
    ///
    /// - `$$` produces a literal `$`.
    /// - `${NAME}` accepts `[A-Za-z0-9_.]` names; `$NAME` accepts `[A-Za-z0-9_]`.
    /// - References to undefined variables, and a `$` that does not start a
    ///   reference, are copied through unchanged.
    pub fn expand(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
                continue;
            }

            if let Some(inner) = after.strip_prefix('{') {
                match inner.find('}') {
                    Some(end) if end > 0 && inner[..end].chars().all(is_braced_name_char) => {
                        let name = &inner[..end];
                        match self.get(name) {
                            Some(value) => out.push_str(value),
                            None => {
                                out.push_str("${");
                                out.push_str(name);
                                out.push('}');
                            }
                        }
                        rest = &inner[end + 1..];
                    }
                    _ => {
                        out.push('$');
                        rest = after;
                    }
                }
                continue;
            }

            let len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
            if len == 0 {
                out.push('$');
                rest = after;
                continue;
            }
            let name = &after[..len];
            match self.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
        }

        out.push_str(rest);
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BuildEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_braced_name_char(c: char) -> bool {
    is_name_char(c) || c == '.'
}
