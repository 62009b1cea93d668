// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Composited  │ ──▶ │ Snapshot Pipeline │ ──▶ │   Gallery    │
//! │   surface    │     │  - PNG encoding   │     │  (10 items)  │
//! │              │     │  - Blob registry  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```

pub mod snapshot;
