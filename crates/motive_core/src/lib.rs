//! Motive Core
//!
//! Shared primitives for the motion engine: geometry, pointer events, the
//! bounded movement history, engine configuration and the execution-resource
//! protocol that decides which interaction currently owns a component's motion.
//!
//! # Modules
//!
//! - [`geometry`] - points and 2D affine transforms
//! - [`ring_buffer`] - fixed-capacity overwrite-oldest buffer
//! - [`events`] - pointer events and the millisecond time base
//! - [`config`] - [`MotionConfig`] with TOML loading
//! - [`session`] - diagnostic sinks for user-facing messages
//! - [`weak_cache`] - shared-but-not-owning lookup tables
//! - [`resource`] - claim/release arbitration of execution resources

pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod resource;
pub mod ring_buffer;
pub mod session;
pub mod weak_cache;

pub use config::MotionConfig;
pub use error::{CoreError, Result};
pub use events::{Millis, PointerEvent, PointerEventKind, PointerId};
pub use geometry::{Point, Transform2D};
pub use resource::{
    ComponentId, ExecutionResource, ExecutionResourceHolder, ResourceArbitrator, ResourceKind,
    ResourceOwner,
};
pub use ring_buffer::RingBuffer;
pub use session::{CapturingSession, LogLevel, Session, SharedSession, TracingSession};
pub use weak_cache::WeakCache;
