#![forbid(unsafe_code)]

use std::collections::HashMap;

/// `Scope<T>` is a name → fact map with stack discipline, used for
/// substitution environments and for the range/alignment facts threaded
/// through a traversal.
/// - `push(name, fact)` shadows any existing binding of `name`.
/// - `pop()` removes the most recent push; pops must mirror pushes exactly.
/// - `get(name)` sees only the innermost binding.
///
/// Push, pop and lookup are O(1) amortized: each name owns a stack of
/// facts and a push log records which stack to pop next.
#[derive(Clone, Debug)]
pub struct Scope<T> {
    table: HashMap<String, Vec<T>>,
    log: Vec<String>,
}

/// Identifies one `push`, so callers can assert that pops mirror pushes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeHandle {
    depth: usize,
    name: String,
}

impl ScopeHandle {
    /// Number of live bindings right after the push (1-based).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scope<T> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            log: Vec::new(),
        }
    }

    /// A store with no bindings.
    pub fn empty() -> Self {
        Self::new()
    }

    pub fn push(&mut self, name: impl Into<String>, fact: T) -> ScopeHandle {
        let name = name.into();
        self.table.entry(name.clone()).or_default().push(fact);
        self.log.push(name.clone());
        ScopeHandle {
            depth: self.log.len(),
            name,
        }
    }

    /// Removes the most recently pushed binding.
    pub fn pop(&mut self) -> Option<(String, T)> {
        let name = self.log.pop()?;
        let stack = self.table.get_mut(&name)?;
        let fact = stack.pop()?;
        if stack.is_empty() {
            self.table.remove(&name);
        }
        Some((name, fact))
    }

    /// Pops the binding created by `handle`, which must be the innermost one.
    pub fn pop_handle(&mut self, handle: ScopeHandle) -> Option<T> {
        debug_assert_eq!(
            self.log.len(),
            handle.depth,
            "scope pop out of order: expected `{}` on top",
            handle.name
        );
        debug_assert_eq!(self.log.last().map(String::as_str), Some(handle.name.as_str()));
        self.pop().map(|(_, fact)| fact)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.table.get(name).and_then(|stack| stack.last())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Number of live bindings, counting shadowed ones.
    pub fn depth(&self) -> usize {
        self.log.len()
    }

    /// Number of distinct visible names.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Visible (innermost) binding of every name, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.table
            .iter()
            .filter_map(|(name, stack)| stack.last().map(|fact| (name.as_str(), fact)))
    }
}

impl<T> FromIterator<(String, T)> for Scope<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (name, fact) in iter {
            scope.push(name, fact);
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_shadows_and_pop_restores() {
        let mut s: Scope<i32> = Scope::empty();
        assert!(s.is_empty());
        assert_eq!(s.get("x"), None);

        s.push("x", 1);
        s.push("y", 2);
        s.push("x", 3);
        assert_eq!(s.get("x"), Some(&3));
        assert_eq!(s.depth(), 3);
        assert_eq!(s.len(), 2);

        assert_eq!(s.pop(), Some(("x".to_string(), 3)));
        assert_eq!(s.get("x"), Some(&1));
        assert_eq!(s.pop(), Some(("y".to_string(), 2)));
        assert!(!s.contains("y"));
        assert_eq!(s.pop(), Some(("x".to_string(), 1)));
        assert!(!s.contains("x"));
        assert_eq!(s.pop(), None);
    }

    #[test]
    fn handles_track_depth() {
        let mut s: Scope<&str> = Scope::new();
        let a = s.push("a", "outer");
        let b = s.push("b", "inner");
        assert_eq!(a.depth(), 1);
        assert_eq!(b.depth(), 2);
        assert_eq!(b.name(), "b");
        assert_eq!(s.pop_handle(b), Some("inner"));
        assert_eq!(s.pop_handle(a), Some("outer"));
        assert!(s.is_empty());
    }

    #[test]
    #[should_panic(expected = "scope pop out of order")]
    #[cfg(debug_assertions)]
    fn out_of_order_pop_is_loud() {
        let mut s: Scope<i32> = Scope::new();
        let a = s.push("a", 1);
        let _b = s.push("b", 2);
        s.pop_handle(a);
    }

    #[test]
    fn iter_sees_innermost_bindings() {
        let s: Scope<i32> = vec![("x".to_string(), 1), ("x".to_string(), 5), ("y".to_string(), 2)]
            .into_iter()
            .collect();
        let mut seen: Vec<_> = s.iter().map(|(n, v)| (n.to_string(), *v)).collect();
        seen.sort();
        assert_eq!(seen, vec![("x".to_string(), 5), ("y".to_string(), 2)]);
    }
}
