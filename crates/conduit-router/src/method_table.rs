//! Per-template method table.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to operation ids for one path template.
///
/// # Example
///
/// ```rust
/// use conduit_router::MethodTable;
/// use http::Method;
///
/// let mut table = MethodTable::new();
/// table.insert(&Method::GET, "GetCurrentUser").unwrap();
/// table.insert(&Method::PUT, "UpdateUser").unwrap();
///
/// assert_eq!(table.get(&Method::PUT), Some("UpdateUser"));
/// assert_eq!(table.get(&Method::DELETE), None);
/// assert!(table.insert(&Method::GET, "Other").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    entries: SmallVec<[(Method, String); 4]>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation for `method`.
    ///
    /// Returns the operation already registered for the method, if any, and
    /// leaves the table unchanged in that case.
    pub fn insert(&mut self, method: &Method, operation_id: impl Into<String>) -> Result<(), &str> {
        if let Some(index) = self.entries.iter().position(|(m, _)| m == method) {
            return Err(self.entries[index].1.as_str());
        }
        self.entries.push((method.clone(), operation_id.into()));
        Ok(())
    }

    /// Returns the operation id registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, op)| op.as_str())
    }

    /// Returns the methods with a registered operation, in insertion order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_method_keeps_first() {
        let mut table = MethodTable::new();
        table.insert(&Method::POST, "FollowUser").unwrap();
        assert_eq!(table.insert(&Method::POST, "Other"), Err("FollowUser"));
        assert_eq!(table.get(&Method::POST), Some("FollowUser"));
    }

    #[test]
    fn test_allowed_methods() {
        let mut table = MethodTable::new();
        assert!(table.is_empty());
        table.insert(&Method::POST, "FollowUser").unwrap();
        table.insert(&Method::DELETE, "UnFollowUser").unwrap();
        assert_eq!(table.allowed_methods(), vec![Method::POST, Method::DELETE]);
    }

    #[test]
    fn test_extension_methods() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut table = MethodTable::new();
        table.insert(&purge, "Purge").unwrap();
        assert_eq!(table.get(&purge), Some("Purge"));
        assert_eq!(table.get(&Method::GET), None);
    }
}
