// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn system_clock_returns_plausible_time() {
    let clock = SystemClock;
    let now = clock.now();
    assert!(now.and_utc().timestamp() > 0);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new(base());
    clock.advance(chrono::Duration::seconds(60));
    assert_eq!(clock.now(), base() + chrono::Duration::seconds(60));
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new(base());
    let clock2 = clock1.clone();
    clock2.advance(chrono::Duration::minutes(30));
    assert_eq!(clock1.now(), base() + chrono::Duration::minutes(30));
}

#[test]
fn fake_clock_set() {
    let clock = FakeClock::new(base());
    let later = base() + chrono::Duration::days(1);
    clock.set(later);
    assert_eq!(clock.now(), later);
}
