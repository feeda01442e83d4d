//! # VIGIL Core
//!
//! The passive vocabulary of the detection engine: who acted, where, with
//! what, on which block.
//!
//! ## Architecture Rules
//!
//! 1. **Data only** - no detection logic and no shared state lives here
//! 2. **Host-agnostic** - the world is reached through [`BlockView`] only
//! 3. **Table-driven classification** - materials and tools map to small
//!    enums that index constant tables
//!
//! ## Example
//!
//! ```rust,ignore
//! use vigil_core::{BlockPos, BreakEvent, Material, Tool, ToolTier};
//!
//! let event = BreakEvent::new(
//!     BlockPos::new(10, 12, -4),
//!     Material::DiamondOre,
//!     Tool::Pickaxe(ToolTier::Iron),
//!     1_700_000_000_000,
//! );
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod entity;
pub mod event;
pub mod material;
pub mod position;
pub mod tool;
pub mod world;

pub use entity::EntityId;
pub use event::{ActionEvent, BreakEvent, ClickSample, DamageSample, Millis, MoveSample, Timestamped};
pub use material::{HardnessClass, Material};
pub use position::{BlockPos, Position};
pub use tool::{Tool, ToolTier, UnknownTool};
pub use world::{BlockView, SparseBlockMap};
