//! Shared utilities for `bugboard`.
//!
//! - Time parsing and formatting (RFC3339, bare dates)
//! - ID generation (UUID v4)

pub mod time;

/// Generate a fresh opaque entity ID.
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_unique_uuid() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
