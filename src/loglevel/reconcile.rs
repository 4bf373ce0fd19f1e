//! Merging of global and component level maps.

use crate::loglevel::level::{LevelMap, DEFAULT_KEY};

/// Combine `global` and `component` into the effective map.
///
/// Component entries always win. Keys only present globally are carried
/// through, except that a component `default` replaces their value.
/// Neither input is modified.
pub fn reconcile(global: &LevelMap, component: &LevelMap) -> LevelMap {
    let fallback = component
        .get(DEFAULT_KEY)
        .map(String::as_str)
        .filter(|level| !level.is_empty());

    let mut effective = component.clone();
    for (key, level) in global {
        if effective.contains_key(key) {
            continue;
        }
        let level = fallback.unwrap_or(level.as_str());
        effective.insert(key.clone(), level.to_string());
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> LevelMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_component_entries_win() {
        let global = map(&[("pkgA", "DEBUG"), ("default", "INFO")]);
        let component = map(&[("pkgA", "ERROR")]);
        let effective = reconcile(&global, &component);
        assert_eq!(effective["pkgA"], "ERROR");
        assert_eq!(effective["default"], "INFO");
    }

    #[test]
    fn test_component_default_replaces_global_values() {
        let global = map(&[("pkgA", "DEBUG")]);
        let component = map(&[("default", "WARN")]);
        let effective = reconcile(&global, &component);
        assert_eq!(effective["pkgA"], "WARN");
        assert_eq!(effective["default"], "WARN");
    }

    #[test]
    fn test_component_default_applies_to_global_default() {
        let global = map(&[("default", "DEBUG"), ("pkgB", "INFO")]);
        let component = map(&[("default", "ERROR"), ("pkgA", "INFO")]);
        let effective = reconcile(&global, &component);
        assert_eq!(effective, map(&[("default", "ERROR"), ("pkgA", "INFO"), ("pkgB", "ERROR")]));
    }

    #[test]
    fn test_no_fallback_without_component_default() {
        let global = map(&[("pkgA", "DEBUG")]);
        let effective = reconcile(&global, &LevelMap::new());
        assert_eq!(effective, global);
    }

    #[test]
    fn test_empty_component_default_is_ignored() {
        let global = map(&[("pkgA", "DEBUG")]);
        let component = map(&[("default", "")]);
        assert_eq!(reconcile(&global, &component)["pkgA"], "DEBUG");
    }

    #[test]
    fn test_empty_global_returns_component() {
        let component = map(&[("pkgA", "ERROR"), ("default", "WARN")]);
        assert_eq!(reconcile(&LevelMap::new(), &component), component);
    }

    #[test]
    fn test_inputs_untouched() {
        let global = map(&[("pkgA", "DEBUG")]);
        let component = map(&[("default", "WARN")]);
        let _ = reconcile(&global, &component);
        assert_eq!(global, map(&[("pkgA", "DEBUG")]));
        assert_eq!(component, map(&[("default", "WARN")]));
    }

    #[test]
    fn test_idempotent() {
        let global = map(&[("pkgA", "DEBUG"), ("pkgB", "INFO"), ("default", "INFO")]);
        let component = map(&[("default", "WARN"), ("pkgB", "ERROR")]);
        let once = reconcile(&global, &component);
        let twice = reconcile(&global, &once);
        assert_eq!(once, twice);
    }
}
