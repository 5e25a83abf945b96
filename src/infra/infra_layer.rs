// The infra module contains implementations of core traits.
// Each external system gets its own submodule.

#[path = "google_auth/mod.rs"]
pub mod google_auth;

#[path = "google_sheets/mod.rs"]
pub mod google_sheets;

#[path = "mail/mod.rs"]
pub mod mail;

#[cfg(test)]
#[path = "test_http.rs"]
pub mod test_http;
