//! Open windows and "open at" membership

use serde::{Deserialize, Serialize};

/// A span of the week, in week-relative UTC seconds, during which a location
/// is open. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWindow {
    pub open: i64,
    pub close: i64,
}

impl OpenWindow {
    pub fn contains(&self, week_seconds: i64) -> bool {
        self.open <= week_seconds && week_seconds <= self.close
    }
}

/// Every window of one schedule. Built whole from the raw day strings and
/// never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenWindows(Vec<OpenWindow>);

impl OpenWindows {
    pub fn new(windows: Vec<OpenWindow>) -> Self {
        Self(windows)
    }

    /// Whether any window contains the given week-relative second
    pub fn is_open_at(&self, week_seconds: i64) -> bool {
        self.0.iter().any(|w| w.contains(week_seconds))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenWindow> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<OpenWindow> for OpenWindows {
    fn from_iter<I: IntoIterator<Item = OpenWindow>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let windows = OpenWindows::new(vec![OpenWindow {
            open: 100,
            close: 200,
        }]);
        assert!(!windows.is_open_at(99));
        assert!(windows.is_open_at(100));
        assert!(windows.is_open_at(150));
        assert!(windows.is_open_at(200));
        assert!(!windows.is_open_at(201));
    }

    #[test]
    fn empty_schedule_is_closed() {
        assert!(!OpenWindows::default().is_open_at(0));
    }

    #[test]
    fn serializes_as_plain_list() {
        let windows = OpenWindows::new(vec![OpenWindow { open: 1, close: 2 }]);
        let json = serde_json::to_string(&windows).unwrap();
        assert_eq!(json, r#"[{"open":1,"close":2}]"#);
    }
}
