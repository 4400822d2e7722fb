//! Request authorization
//!
//! Callers authenticate with a shared secret in the `Authorization`
//! header. Only a `Basic ` scheme prefix is stripped before the
//! comparison; a `Bearer ` prefix is left in place and will not match
//! a bare secret. Clients therefore present either `Basic <secret>`
//! or the secret verbatim.

use crate::error::Result;
use crate::store::SecretStore;

/// Compare the presented `Authorization` value against the shared
/// secret fetched from `secrets`.
///
/// A missing or empty header is rejected immediately without touching
/// the secret store.
///
/// # Errors
///
/// Returns [`Error::Secret`](crate::Error::Secret) when the secret
/// itself cannot be fetched; that is an internal failure, not a
/// rejection.
pub async fn authorize(
    header: Option<&str>,
    secret_name: &str,
    secrets: &dyn SecretStore,
) -> Result<bool> {
    let Some(value) = header else {
        return Ok(false);
    };
    if value.is_empty() {
        return Ok(false);
    }

    // First occurrence anywhere in the value, not an anchored prefix.
    let token = value.replacen("Basic ", "", 1);
    let expected = secrets.fetch(secret_name).await?;
    Ok(token == expected)
}
