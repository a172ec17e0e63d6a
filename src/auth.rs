//! Admin credential checks.
//!
//! The dispatcher asks an [`AdminGate`] whether a request may run an
//! admin-only route. The gate sees only the request headers, so a different
//! scheme (signed tokens, per-admin keys) can be plugged in without touching
//! routing.

use crate::request::find_header;

/// Decides whether a request carries admin rights.
pub trait AdminGate: Send + Sync {
    fn authorize(&self, headers: &[(String, String)]) -> bool;
}

/// One shared secret, compared by plain equality.
///
/// The credential is taken from `X-Admin-Token` when present, otherwise from
/// `Authorization` with a leading `Bearer` removed. An `Authorization` value
/// without the prefix is compared as-is. An empty secret opens every admin
/// route.
#[derive(Debug, Clone)]
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn is_open(&self) -> bool {
        self.secret.is_empty()
    }

    fn presented(headers: &[(String, String)]) -> Option<&str> {
        if let Some(token) = find_header(headers, "x-admin-token").filter(|v| !v.is_empty()) {
            return Some(token.trim());
        }
        let auth = find_header(headers, "authorization")?;
        Some(auth.strip_prefix("Bearer").unwrap_or(auth).trim())
    }
}

impl AdminGate for SharedSecret {
    fn authorize(&self, headers: &[(String, String)]) -> bool {
        if self.is_open() {
            return true;
        }
        Self::presented(headers).is_some_and(|token| token == self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[rstest]
    #[case(&[("X-Admin-Token", "s3cret")], true)]
    #[case(&[("x-admin-token", " s3cret ")], true)]
    #[case(&[("Authorization", "Bearer s3cret")], true)]
    #[case(&[("Authorization", "s3cret")], true)]
    #[case(&[("Authorization", "Bearer wrong")], false)]
    #[case(&[("X-Admin-Token", "wrong"), ("Authorization", "Bearer s3cret")], false)]
    #[case(&[("X-Admin-Token", ""), ("Authorization", "Bearer s3cret")], true)]
    #[case(&[], false)]
    fn shared_secret(#[case] pairs: &[(&str, &str)], #[case] allowed: bool) {
        let gate = SharedSecret::new("s3cret");
        assert_eq!(gate.authorize(&headers(pairs)), allowed);
    }

    #[test]
    fn empty_secret_is_open_mode() {
        let gate = SharedSecret::new("");
        assert!(gate.is_open());
        assert!(gate.authorize(&[]));
    }
}
