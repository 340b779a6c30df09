use std::path::{Component, Path};

/// Joins the normal components of a relative path with `/`, which is the form ignore rules
/// are matched against on every platform.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A substituted path segment must stay a plain, non-empty relative path so the output
/// cannot escape its root.
pub fn is_safe_segment(segment: &str) -> bool {
    let path = Path::new(segment);

    !segment.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
