// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recall integration tests.
//!
//! Provides a deterministic embedding adapter and a harness that wires a
//! [`recall_memory::MemoryManager`] over a temporary SQLite database, so
//! tests run without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Hashed bag-of-words embeddings with a failure switch
//! - [`TestHarness`] - Temp database, storage adapter and manager in one place

pub mod harness;
pub mod mock_embedder;

pub use harness::TestHarness;
pub use mock_embedder::MockEmbedder;
