// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rotating password of the shared free-trial login.
//!
//! The password is a pure function of the UTC date and 3-hour window, so the
//! admin panel and any client compute the same value without coordination.
//! It is advisory, not a secret.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

/// Uppercase letters and digits without the look-alikes `I`, `O`, `0` and `1`.
pub const TRIAL_PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of the generated password.
pub const TRIAL_PASSWORD_LEN: usize = 4;

/// Width of one rotation window.
pub const ROTATION_WINDOW_HOURS: u32 = 3;

const LCG_MULTIPLIER: u64 = 1_664_525;
const LCG_INCREMENT: u64 = 1_013_904_223;
const LCG_MODULUS: u64 = 1 << 32;
const WARM_UP_ROUNDS: usize = 2;

/// Minimal linear congruential generator (Numerical Recipes constants).
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = (LCG_MULTIPLIER * self.0 + LCG_INCREMENT) % LCG_MODULUS;
        self.0
    }
}

/// Seed for the window containing `now`.
///
/// `year * 10000 + month * 100 + day * 10 + window`, with a zero-based month
/// (January = 0) to stay compatible with passwords already handed out by the
/// web client.
pub fn rotation_seed(now: DateTime<Utc>) -> u64 {
    let year = u64::try_from(now.year()).unwrap_or(0);
    let month = u64::from(now.month0());
    let day = u64::from(now.day());
    let window = u64::from(now.hour() / ROTATION_WINDOW_HOURS);

    year * 10_000 + month * 100 + day * 10 + window
}

/// Password derived from a raw seed.
pub fn trial_password_for_seed(seed: u64) -> String {
    let mut lcg = Lcg(seed % LCG_MODULUS);
    for _ in 0..WARM_UP_ROUNDS {
        lcg.next();
    }

    (0..TRIAL_PASSWORD_LEN)
        .map(|_| {
            let index = (lcg.next() % TRIAL_PASSWORD_ALPHABET.len() as u64) as usize;
            char::from(TRIAL_PASSWORD_ALPHABET[index])
        })
        .collect()
}

/// Password valid for the free-trial login at `now`.
pub fn current_trial_password(now: DateTime<Utc>) -> String {
    trial_password_for_seed(rotation_seed(now))
}

/// Start and end (exclusive) of the rotation window containing `now`.
pub fn rotation_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_hour = now.hour() - now.hour() % ROTATION_WINDOW_HOURS;
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), start_hour, 0, 0)
        .single()
        .unwrap_or(now);
    (start, start + Duration::hours(i64::from(ROTATION_WINDOW_HOURS)))
}
