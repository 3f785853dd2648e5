// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod catalog;
pub mod cleanup;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod kubernetes;
pub mod retry;
pub mod tasks;
pub mod types;
pub mod watcher;

#[cfg(test)]
mod test_utils;
