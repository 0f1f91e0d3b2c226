//! Completion waiter
//!
//! Fixed-interval polling until a resource leaves its transitional state.
//! The first poll happens one interval after the call, and the loop gives up
//! once the elapsed time reaches the timeout. Since a [`WaitPolicy`] never has
//! an interval longer than its timeout, at least one poll always happens.

use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::WaitPolicy;
use crate::error::{Error, Result};
use crate::model::{Resource, ResourceState};

/// Poll `fetch` until the resource is ready
///
/// # Returns
///
/// - `Ok(R)`: the first snapshot in a ready state (or without any state)
/// - `Err(Error::Remote)`: the provider reported `FAILED` or an unknown state
/// - `Err(Error::Timeout)`: the resource was still transitional at the deadline
pub async fn wait_for<R, F, Fut>(
    provider_name: &str,
    id: &str,
    policy: &WaitPolicy,
    mut fetch: F,
) -> Result<R>
where
    R: Resource,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let kind = R::KIND;
    let started = Instant::now();
    let mut polls = 0usize;

    info!(
        "Waiting up to {:?} for {} {} (polling every {:?})",
        policy.timeout(),
        kind,
        id,
        policy.interval()
    );

    loop {
        tokio::time::sleep(policy.interval()).await;

        let resource = fetch().await?;
        polls += 1;

        let state = match resource.state() {
            Some(raw) => ResourceState::parse(raw),
            None => return Ok(resource),
        };

        match state {
            ResourceState::Ready(_) => {
                debug!("{} {} ready after {} poll(s)", kind, id, polls);
                return Ok(resource);
            }
            ResourceState::Failed => {
                return Err(Error::remote(
                    provider_name,
                    format!("{} creation failed for {}", kind, id),
                ));
            }
            ResourceState::Unknown(raw) => {
                return Err(Error::remote(
                    provider_name,
                    format!("Unknown {} state {}", kind, raw),
                ));
            }
            ResourceState::Transitional(raw) => {
                debug!("{} {} still {} (poll {})", kind, id, raw, polls);
            }
        }

        if started.elapsed() >= policy.timeout() {
            return Err(Error::timeout(format!(
                "Timed out waiting for {} completion for {} after {} poll(s)",
                kind, id, polls
            )));
        }
    }
}
