//! Email pool and API-key handling for NCBI requests.
//!
//! Entrez wants a contact email on every call; the pool rotates addresses
//! round-robin so sustained batches spread their identification. The pool is
//! owned by whoever builds the clients and passed in explicitly, never a
//! process-wide singleton.

use std::sync::Mutex;

const DEFAULT_EMAILS: &[&str] = &[
    "bk68g1gx@test.com",
    "wkv1h06c@sample.com",
    "m42touro@sample.com",
    "vy8u7tsx@test.com",
    "8xsqaxke@sample.com",
    "cilml02q@sample.com",
    "1s1ywssv@demo.com",
    "pfd4bf0y@demo.com",
    "hvjhnv7o@test.com",
    "vtirmn0j@sample.com",
];

#[derive(Debug)]
pub struct CredentialPool {
    emails: Vec<String>,
    next: Mutex<usize>,
    api_key: Option<String>,
}

impl CredentialPool {
    /// Pool from an explicit email list; falls back to the built-in list
    /// when `emails` is empty.
    pub fn new(emails: Vec<String>, api_key: Option<String>) -> Self {
        let emails = if emails.is_empty() {
            DEFAULT_EMAILS.iter().map(|s| s.to_string()).collect()
        } else {
            emails
        };
        Self {
            emails,
            next: Mutex::new(0),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Parse a comma-separated pool, as carried by the `EMAILS` variable.
    pub fn from_env_value(value: Option<&str>, api_key: Option<String>) -> Self {
        let emails = value
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self::new(emails, api_key)
    }

    /// Next email, strict round-robin with wrap-around. Thread-safe.
    pub fn next_email(&self) -> String {
        let mut next = self.next.lock().expect("email rotation lock poisoned");
        let email = self.emails[*next % self.emails.len()].clone();
        *next = (*next + 1) % self.emails.len();
        email
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// 10 req/s with a key, 3 without.
    pub fn rate_limit(&self) -> u32 {
        if self.api_key.is_some() {
            10
        } else {
            3
        }
    }
}
