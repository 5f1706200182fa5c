//! Adaptive poll scheduling
//!
//! This module decides when poll cycles run. Cadence depends on the time of
//! day: a short interval inside the day window and a long one outside it.
//!
//! # Modules
//!
//! - [`cadence`] - Day/night policy and wall-clock aligned poll slots
//! - [`heartbeat`] - One-minute heartbeat, overlap guard and cycle timeout
//!
//! # Example
//!
//! ```ignore
//! use feedcast::scheduler::{CadencePolicy, HeartbeatScheduler};
//!
//! let scheduler = HeartbeatScheduler::new(CadencePolicy::default(), relay)
//!     .with_cycle_timeout(std::time::Duration::from_secs(300));
//! scheduler.run(tokio::signal::ctrl_c().map(|_| ())).await;
//! ```
//!
//! # Defaults
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `day_start` | 05:00 | Start of the short-cadence window |
//! | `night_start` | 22:00 | Start of the long-cadence window |
//! | `day_interval_minutes` | 10 | Poll interval by day |
//! | `night_interval_minutes` | 120 | Poll interval by night |
//! | `heartbeat_secs` | 60 | Cadence re-evaluation period |

pub mod cadence;
pub mod heartbeat;

pub use crate::utils::error::SchedulerError;
pub use cadence::{Cadence, CadencePolicy};
pub use heartbeat::{Clock, Heartbeat, HeartbeatScheduler, PollCycleState, PollJob, SystemClock};
