use std::collections::BTreeMap;

use crate::error::ConfigError;

/// normalize_path
///
/// Canonical form used for every lookup: query string and fragment removed,
/// empty segments collapsed, no trailing slash (except for `/` itself).
pub fn normalize_path(raw: &str) -> String {
    let path = raw
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Joins a namespace root and a page slug. An empty slug yields the root.
pub fn join(base: &str, slug: &str) -> String {
    normalize_path(&format!("{}/{}", base, slug))
}

/// True when `path` equals `root` or lies beneath it on a segment boundary.
pub fn is_within(root: &str, path: &str) -> bool {
    if root == "/" {
        return true;
    }
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// PathPattern
///
/// A route path where segments of the form `{name}` capture one path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(path: &str) -> Result<Self, ConfigError> {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                path: path.to_string(),
            });
        }

        let segments = normalize_path(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                    Ok(Segment::Param(name.to_string()))
                }
                Some(_) => Err(ConfigError::InvalidPath {
                    path: path.to_string(),
                }),
                None if s.contains(['{', '}']) => Err(ConfigError::InvalidPath {
                    path: path.to_string(),
                }),
                None => Ok(Segment::Literal(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Matches an already-normalized path, returning captured parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    let value = urlencoding::decode(part).ok()?.into_owned();
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(params)
    }
}
