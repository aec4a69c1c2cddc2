//! Transport-agnostic credential verification.
//!
//! Credential extraction is transport-specific (JSON body on HTTP). This
//! module only answers whether a username/password pair is valid.

use subtle::ConstantTimeEq;

/// Checks a username/password pair.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

impl<F> CredentialVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

/// A single configured account, compared in constant time.
#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new("user", "pass")
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        // Evaluate both so a wrong username costs the same as a wrong password.
        let user_ok = ct_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = ct_eq(password.as_bytes(), self.password.as_bytes());
        user_ok & pass_ok
    }
}

/// Constant-time comparison of two byte slices.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_matches_only_exact_pair() {
        let creds = StaticCredentials::default();
        assert!(creds.verify("user", "pass"));
        assert!(!creds.verify("user", "wrong"));
        assert!(!creds.verify("admin", "pass"));
        assert!(!creds.verify("", ""));
        assert!(!creds.verify("user", "pass "));
    }

    #[test]
    fn closures_are_verifiers() {
        let always = |_: &str, _: &str| true;
        assert!(always.verify("anyone", "anything"));
    }
}
