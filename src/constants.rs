// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Default CLI values
pub mod defaults {
    /// Overall run deadline
    pub const TIMEOUT: &str = "120s";
    /// Wait for graceful namespace termination before stripping finalizers
    pub const GRACE_PERIOD: &str = "10s";
}

/// Exponential backoff curve used when retrying finalizer cleanup
pub mod backoff {
    pub const INITIAL_INTERVAL_MILLIS: u64 = 500;
    pub const MULTIPLIER: f64 = 1.5;
    pub const RANDOMIZATION_FACTOR: f64 = 0.5;
    pub const MAX_INTERVAL_SECS: u64 = 60;
}

/// Verbs and phases reported by the API server
pub mod api {
    pub const VERB_LIST: &str = "list";
    pub const PHASE_TERMINATING: &str = "Terminating";
}
