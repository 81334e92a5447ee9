// Verification / password-reset code store
// Process-wide map, single-instance semantics: a horizontally scaled
// deployment needs a shared keyed cache instead.

use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
struct StoredCode {
    code: String,
    created_at: i64,
}

/// Short-lived numeric codes keyed by subject email.
///
/// A code is consumed on its first successful validation. A mismatch leaves
/// the stored code intact so the subject can retry. Entries older than
/// `ttl_secs` are rejected and purged on access.
pub struct CodeStore {
    entries: DashMap<String, StoredCode>,
    ttl_secs: i64,
}

impl CodeStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_secs,
        }
    }

    /// Generate a 6-digit code and store it against the email.
    /// A new code replaces any previous one for the same subject.
    pub fn issue(&self, email: &str) -> String {
        let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        self.entries.insert(
            normalize(email),
            StoredCode {
                code: code.clone(),
                created_at: Utc::now().timestamp(),
            },
        );
        code
    }

    /// Validate a submitted code by exact string equality.
    /// Deletes the entry on match so the code is single use.
    pub fn verify(&self, email: &str, code: &str) -> AppResult<()> {
        let key = normalize(email);
        let now = Utc::now().timestamp();

        let created_at = match self.entries.get(&key) {
            Some(entry) => entry.created_at,
            None => return Err(AppError::Validation("Invalid code".to_string())),
        };

        if now - created_at >= self.ttl_secs {
            self.entries.remove(&key);
            return Err(AppError::Validation("Code expired".to_string()));
        }

        // remove_if keeps consume-on-match atomic under concurrent submits
        match self.entries.remove_if(&key, |_, stored| stored.code == code) {
            Some(_) => Ok(()),
            None => Err(AppError::Validation("Invalid code".to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_consumed_on_first_successful_use() {
        let store = CodeStore::new(900);
        let code = store.issue("a@b.com");

        assert!(store.verify("a@b.com", &code).is_ok());
        assert!(store.verify("a@b.com", &code).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn mismatch_keeps_the_stored_code_valid() {
        let store = CodeStore::new(900);
        let code = store.issue("a@b.com");

        assert!(store.verify("a@b.com", "000000").is_err());
        assert_eq!(store.len(), 1);
        assert!(store.verify("a@b.com", &code).is_ok());
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let store = CodeStore::new(900);
        assert!(store.verify("nobody@b.com", "123456").is_err());
    }

    #[test]
    fn expired_code_is_rejected_and_purged() {
        // ttl of zero expires entries on the next access
        let store = CodeStore::new(0);
        let code = store.issue("a@b.com");

        let err = store.verify("a@b.com", &code).unwrap_err();
        assert!(err.to_string().contains("expired"));
        assert!(store.is_empty());
    }

    #[test]
    fn reissue_replaces_the_previous_code() {
        let store = CodeStore::new(900);
        let first = store.issue("a@b.com");
        let second = store.issue("a@b.com");

        if first != second {
            assert!(store.verify("a@b.com", &first).is_err());
        }
        assert!(store.verify("a@b.com", &second).is_ok());
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let store = CodeStore::new(900);
        let code = store.issue("User@B.com");
        assert!(store.verify("user@b.com", &code).is_ok());
    }
}
