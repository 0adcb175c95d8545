//! API handlers module

pub mod health;
pub mod sites;
pub mod datasets;
pub mod vocs;
pub mod voc_subclasses;
pub mod contacts;
pub mod publications;

use vocatlas_common::errors::{AppError, Result};

/// Turn an empty collection into `NoMatches`
pub(crate) fn require_matches<T>(items: Vec<T>, message: impl FnOnce() -> String) -> Result<Vec<T>> {
    if items.is_empty() {
        return Err(AppError::NoMatches { message: message() });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_matches() {
        assert_eq!(require_matches(vec![1, 2], || "unused".into()).unwrap(), vec![1, 2]);

        let err = require_matches(Vec::<i32>::new(), || "No site found in the specified area".into())
            .unwrap_err();
        assert!(matches!(err, AppError::NoMatches { ref message } if message.contains("area")));
    }
}
