// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Returns the current epoch time in milliseconds since the UNIX epoch.
pub(crate) fn current_epoch_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("fixed start time")
        .as_millis() as u64
}

/// Creates a [Duration] from a given number of minutes.
/// Can be removed once the `Duration::from_mins` method is stabilized.
pub(crate) fn from_mins(mins: u16) -> Duration {
    Duration::from_secs(mins as u64 * 60)
}
