// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Value types shared between discovery and cleanup.

pub mod resource;

pub use resource::ResourceDefinition;
