//! Ordered fallback execution shared by queue sends and blob uploads.

use std::future::Future;
use tracing::warn;

#[cfg(test)]
#[path = "failover_tests.rs"]
mod tests;

/// Outcome of exhausting an ordered candidate set: how many candidates were
/// attempted and the error from the first of them
#[derive(Debug)]
pub(crate) struct SetExhausted<E> {
    pub attempts: usize,
    pub first_error: E,
}

/// Run `attempt` against the primary candidate and then each backup in
/// order, stopping at the first success.
///
/// Returns the index of the winning candidate (0 for the primary) together
/// with the attempt's value. When every candidate fails, the reported error
/// is the primary's; errors from later candidates are logged and dropped.
pub(crate) async fn first_success<'a, C, T, E, F, Fut>(
    primary: &'a C,
    backups: &'a [C],
    mut attempt: F,
) -> Result<(usize, T), SetExhausted<E>>
where
    C: std::fmt::Display,
    E: std::fmt::Display,
    F: FnMut(&'a C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let first_error = match attempt(primary).await {
        Ok(value) => return Ok((0, value)),
        Err(error) => {
            warn!(candidate = %primary, error = %error, "fallback candidate failed");
            error
        }
    };

    for (offset, candidate) in backups.iter().enumerate() {
        match attempt(candidate).await {
            Ok(value) => return Ok((offset + 1, value)),
            Err(error) => {
                warn!(candidate = %candidate, error = %error, "fallback candidate failed");
            }
        }
    }

    Err(SetExhausted {
        attempts: backups.len() + 1,
        first_error,
    })
}
