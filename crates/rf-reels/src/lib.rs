//! # rf-reels: Reel motion and spin orchestration
//!
//! Plain-data slot machine core: reels scroll, decelerate and snap onto a
//! commanded result, then the middle row is evaluated. Rendering, input and
//! assets stay outside; a host drives `SlotMachine::tick` once per frame and
//! reads reel slots and stage events back out.
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── Reel × N (SymbolSlot × rows+2, Idle → Spinning → Stopping → Idle)
//!     ├── DeferredQueue (spin window, stop pacing)
//!     ├── outcome::generate → TargetGrid
//!     └── evaluate::evaluate → WinResult
//!           │
//!           v
//!     Vec<StageEvent> → presentation
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod machine;
pub mod outcome;
pub mod reel;
pub mod slot;
pub mod stage;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use error::*;
pub use evaluate::*;
pub use machine::*;
pub use outcome::*;
pub use reel::*;
pub use slot::*;
pub use stage::*;
pub use symbols::*;
pub use timing::*;
