/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::tools::error::AppError;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

// Above this many tracked clients, clients with no hit in the current or previous frame
// are forgotten.
const PRUNE_THRESHOLD: usize = 10_000;

/// Applies the sliding window rule to the frames recorded for one client.
///
/// `hits_frame` holds the frame number of every earlier accepted hit. Hits of the previous
/// frame count in proportion to how much of that frame still overlaps the sliding window.
/// Returns the frames to keep, including the current hit, or `None` when the hit exceeds
/// `frame_hits_lim`.
pub fn sliding_window(
    hits_frame: &[i64],
    curr_time: i64,
    frame_hits_lim: usize,
    frame_len: u32,
) -> Option<Vec<i64>> {
    let frame_len = i64::from(frame_len.max(1));
    let curr_frame = curr_time / frame_len;

    let prev_and_curr_frame_hits = hits_frame
        .iter()
        .copied()
        .filter(|hits_frame| *hits_frame == curr_frame - 1 || *hits_frame == curr_frame)
        .collect::<Vec<_>>();

    let curr_frame_hits_len = prev_and_curr_frame_hits
        .iter()
        .filter(|hits_frame| **hits_frame == curr_frame)
        .count();

    let prev_frame_hits_len = prev_and_curr_frame_hits
        .iter()
        .filter(|hits_frame| **hits_frame == curr_frame - 1)
        .count();
    let prev_frame_weight = 1.0 - (curr_time % frame_len) as f64 / frame_len as f64;

    if (prev_frame_hits_len as f64 * prev_frame_weight) as usize + curr_frame_hits_len
        < frame_hits_lim
    {
        let mut new_hits = Vec::with_capacity(prev_and_curr_frame_hits.len() + 1);
        new_hits.push(curr_frame);
        new_hits.extend(prev_and_curr_frame_hits);
        Some(new_hits)
    } else {
        None
    }
}

/// Process-local sliding window limiter keyed by client.
pub struct SlidingWindowRateLimiter {
    hits: Mutex<FxHashMap<String, Vec<i64>>>,
    frame_hits_lim: usize,
    frame_len: u32,
}

impl SlidingWindowRateLimiter {
    pub fn new(frame_hits_lim: usize, frame_len: u32) -> Self {
        Self {
            hits: Mutex::new(FxHashMap::default()),
            frame_hits_lim,
            frame_len,
        }
    }

    /// Records a hit for `key` at `curr_time` (unix seconds), failing with
    /// `HitsLimitExceeded` when the client is over its limit.
    pub async fn check(&self, key: &str, curr_time: i64) -> Result<(), AppError> {
        let mut hits = self.hits.lock().await;

        if hits.len() > PRUNE_THRESHOLD {
            let curr_frame = curr_time / i64::from(self.frame_len.max(1));
            hits.retain(|_, frames| frames.iter().any(|frame| *frame >= curr_frame - 1));
        }

        let hits_frame = hits.get(key).map(Vec::as_slice).unwrap_or_default();
        match sliding_window(hits_frame, curr_time, self.frame_hits_lim, self.frame_len) {
            Some(new_hits) => {
                hits.insert(key.to_string(), new_hits);
                Ok(())
            }
            None => Err(AppError::HitsLimitExceeded(key.to_string())),
        }
    }
}
