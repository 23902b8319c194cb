//! Deterministic simulation core
//!
//! Shared by every game:
//! - Fixed timestep only (`frame`)
//! - Wall-clock timers owned per session (`timers`)
//! - Stable iteration order by entity id (`registry`)
//! - No rendering or platform dependencies

pub mod frame;
pub mod geom;
pub mod registry;
pub mod session;
pub mod timers;

pub use frame::{DEFAULT_STALL_THRESHOLD, FrameDriver};
pub use geom::{Rect, Segment};
pub use registry::{ContactTracker, EntityId, Registry};
pub use session::{Env, Game, Outcome, Session, SessionTimer, TickContext};
pub use timers::{TimerHandle, TimerQueue};
