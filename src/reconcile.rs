//! Turning an oracle batch response into cacheable references.

use std::time::Instant;

use tracing::warn;

use crate::oracle::OracleRate;
use crate::telemetry;
use crate::types::{Identifier, Reference};
use crate::{MuninnError, Result};

/// Build references from `rates`, all stamped with `fetched_at`, with the
/// reference for `target` first and the rest in response order.
///
/// Returns [`MuninnError::InvalidResponse`] when `target` is absent: the
/// oracle and the caller disagree about what was asked, so none of the
/// response is trusted. If the oracle repeats `target`, its last
/// occurrence wins and earlier ones are dropped.
pub fn reconcile(
    target: &Identifier,
    fetched_at: Instant,
    rates: Vec<OracleRate>,
) -> Result<Vec<Reference>> {
    let mut found = None;
    let mut others = Vec::with_capacity(rates.len());

    for rate in rates {
        let reference = Reference::new(rate.identifier(), rate.rate, fetched_at);
        if reference.identifier == *target {
            found = Some(reference);
        } else {
            others.push(reference);
        }
    }

    let Some(target_reference) = found else {
        metrics::counter!(telemetry::INVALID_RESPONSES_TOTAL).increment(1);
        warn!(
            %target,
            returned = others.len(),
            "oracle response is missing the requested identifier"
        );
        return Err(MuninnError::InvalidResponse);
    };

    let mut references = Vec::with_capacity(others.len() + 1);
    references.push(target_reference);
    references.extend(others);
    Ok(references)
}
