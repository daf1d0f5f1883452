//! Redfish communication layer
//!
//! Everything that talks HTTPS/JSON to a management controller lives here.
//! Embedded firmware HTTP stacks are slow, reboot mid-operation, truncate
//! responses and reset connections; this layer absorbs all of that so the
//! services above it only see clean outcomes.
//!
//! # Architecture
//!
//! ```text
//! Service → RedfishClient → controller (iDRAC/BMC)
//!    ↓           ↓
//! Dialect     retry / session
//!    ↓           ↓
//! JobPoller ← task status reads
//! ```
//!
//! # Communication pattern
//!
//! 1. Client logs in (token session, basic-auth fallback)
//! 2. Service submits an OEM action, controller returns a job handle
//! 3. Poller reads the task resource until a terminal state, 404 or timeout
//! 4. Session is torn down best-effort on every exit path

pub mod client;
pub mod dialect;
pub mod poller;

pub use client::{HttpResponse, RedfishClient};
pub use dialect::{ControllerDialect, DellDialect};
pub use poller::{JobOutcome, JobPoller};
