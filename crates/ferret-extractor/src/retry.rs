//! Bounded retry for storage calls

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, error};

/// Run a fallible operation with bounded retry, converting final failure to `None`
///
/// The operation is attempted once and then up to `max_retries` more times.
/// Every failure that is followed by another attempt logs one error line;
/// the last failure logs a single "retries exhausted" error line. All
/// failures are treated alike, whatever their cause.
///
/// # Examples
///
/// ```
/// use ferret_extractor::resilient;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let value = resilient("count", 3, || {
///     calls += 1;
///     let attempt = calls;
///     async move { if attempt < 3 { Err("flaky") } else { Ok(attempt) } }
/// })
/// .await;
/// assert_eq!(value, Some(3));
/// # }
/// ```
pub async fn resilient<T, E, F, Fut>(label: &str, max_retries: u32, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", label, attempt);
                }
                return Some(value);
            }
            Err(err) if attempt < max_retries => {
                attempt += 1;
                error!(
                    "{} failed (attempt {} of {}): {}",
                    label,
                    attempt,
                    max_retries + 1,
                    err
                );
            }
            Err(err) => {
                error!(
                    "{}: retries exhausted after {} attempts: {}",
                    label,
                    attempt + 1,
                    err
                );
                return None;
            }
        }
    }
}
