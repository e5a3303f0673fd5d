//! Dynamic prompt discovery.
//!
//! Nothing about the device is known before the first command, so the prompt
//! is learned from the shell itself: send a few blank lines and look for the
//! string that comes back every time.
//!
//! ```text
//! "\r\nrouter#"                ->  "router#"                  (1 repeat)
//! "\r\nrouter#\r\nrouter#"     ->  "router#", "router#"       (2 repeats)
//! ```
//!
//! Candidates from all rounds are pooled; one that contains another is
//! replaced by the shorter, so banner noise in the first round drops out:
//!
//! ```text
//! ["motd...router#", "router#", "router#"]  ->  "router#"
//! ```

use std::time::Duration;

use log::{debug, trace};

use crate::channel::{Encoding, ShellChannel};
use crate::error::Result;

/// Number of blank lines sent during detection.
pub const DETECTION_ROUNDS: usize = 3;

/// Largest repetition count tried when folding an observation.
const MAX_REPEATS: usize = 5;

/// Split an observation into the largest number (5 down to 1) of identical
/// consecutive chunks.
///
/// Chunks are `len / n` characters wide; a shorter trailing chunk takes part
/// in the comparison, so a split only succeeds when the whole observation is
/// made of the repeated chunk. Returns `None` for an empty observation.
pub fn split_repeats(observation: &str) -> Option<Vec<String>> {
    let chars: Vec<char> = observation.chars().collect();
    if chars.is_empty() {
        return None;
    }

    for repeats in (1..=MAX_REPEATS).rev() {
        let width = chars.len() / repeats;
        if width == 0 {
            continue;
        }
        let chunks: Vec<String> = chars.chunks(width).map(|c| c.iter().collect()).collect();
        if chunks.iter().all(|chunk| *chunk == chunks[0]) {
            return Some(chunks);
        }
    }

    None
}

/// Fold prompt observations into a single prompt string.
///
/// Every non-empty observation is split with [`split_repeats`] and all chunks
/// go into one candidate pool. Whenever one candidate contains another, the
/// containing candidate is replaced by the contained one. The prompt is found
/// when the pool ends up holding a single distinct string.
pub fn fold_repeats<S: AsRef<str>>(observations: &[S]) -> Option<String> {
    let mut pool: Vec<String> = observations
        .iter()
        .map(AsRef::as_ref)
        .filter(|obs| !obs.is_empty())
        .filter_map(split_repeats)
        .flatten()
        .collect();

    reduce_by_containment(&mut pool);

    let first = pool.first()?;
    if pool.iter().all(|candidate| candidate == first) {
        Some(first.clone())
    } else {
        None
    }
}

/// Replace every candidate that contains another distinct candidate with the
/// contained one, until nothing changes.
fn reduce_by_containment(pool: &mut [String]) {
    loop {
        let mut changed = false;
        for i in 0..pool.len() {
            for j in 0..pool.len() {
                if pool[i] != pool[j] && pool[j].contains(pool[i].as_str()) {
                    pool[j] = pool[i].clone();
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Send blank lines to the shell and fold the echoes into a prompt.
///
/// Each round waits up to `read_timeout` for output and then pauses for
/// `settle` so late bytes end up in the next observation instead of the
/// first command's response. Returns `Ok(None)` when no consistent prompt
/// was seen.
pub async fn detect_prompt<C: ShellChannel>(
    channel: &mut C,
    encoding: Encoding,
    read_timeout: Duration,
    settle: Duration,
) -> Result<Option<String>> {
    let mut observations = Vec::with_capacity(DETECTION_ROUNDS);

    for round in 0..DETECTION_ROUNDS {
        channel.write(b"\n").await?;

        let raw = if channel.wait_readable(read_timeout).await? {
            encoding.decode(&channel.read_available()?)
        } else {
            String::new()
        };

        let observation: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        trace!("prompt round {}: {:?}", round + 1, observation);
        observations.push(observation);

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
    }

    let prompt = fold_repeats(&observations);
    debug!("prompt observations {:?} -> {:?}", observations, prompt);
    Ok(prompt)
}
