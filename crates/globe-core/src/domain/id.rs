//! Document identifiers.
//!
//! Ids are 24 lowercase hex characters: a big-endian seconds timestamp
//! followed by eight random bytes, so they sort roughly by creation time.

use chrono::Utc;
use uuid::Uuid;

/// Length of a document id in characters.
pub const DOCUMENT_ID_LEN: usize = 24;

/// Generate a fresh document id.
pub fn new_document_id() -> String {
    let seconds = Utc::now().timestamp() as u32;
    let (random, _) = Uuid::new_v4().as_u64_pair();
    format!("{seconds:08x}{random:016x}")
}

/// Whether `value` has the shape of a document id.
pub fn is_document_id(value: &str) -> bool {
    value.len() == DOCUMENT_ID_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_formed() {
        let id = new_document_id();
        assert_eq!(id.len(), DOCUMENT_ID_LEN);
        assert!(is_document_id(&id));
        assert_ne!(id, new_document_id());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(is_document_id("61958439e0dbd854f5ab9000"));
        assert!(!is_document_id("61958439e0dbd854f5ab900"));
        assert!(!is_document_id("zz958439e0dbd854f5ab9000"));
        assert!(!is_document_id(""));
    }
}
