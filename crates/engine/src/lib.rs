// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! freight-engine: the file-transfer lifecycle core.
//!
//! Discovery, stability detection, queuing, copying, verification and
//! recovery live here. The daemon crate wires these pieces together and
//! exposes them to the control surface.

pub mod bus;
pub mod classifier;
pub mod copy;
pub mod growth;
pub mod monitor;
pub mod probe;
pub mod queue;
pub mod repository;
pub mod scanner;
pub mod space;
pub mod state_machine;
pub mod stats;
pub mod worker;

pub use bus::EventBus;
pub use classifier::{classify_copy_error, ClassifyCtx, Outcome};
pub use copy::{CopyEngine, CopyError, FlatLayout, PathTemplate};
pub use monitor::StorageMonitor;
pub use queue::{CopyJob, CopyQueue, FailedJob, QueueProducer, QueueStatus};
pub use repository::{FileRepository, RepositoryError};
pub use scanner::{Scanner, ScannerGate};
pub use space::{check_space, SpaceArbiter};
pub use state_machine::{StateMachine, TransitionError};
pub use stats::{StatsSnapshot, TransferStats};
pub use worker::{WorkerDeps, WorkerPool};
