//! Interaction core for the annotation canvas.
//!
//! This crate turns raw pointer events into a draw / select / transform /
//! recolor workflow over a fixed-size canvas of rectangle annotations, and
//! describes every resulting mutation as a sync op for the host to persist.
//! It performs no I/O: the host (see the `client` crate) wires input events
//! to [`engine::EngineCore`], runs the emitted [`sync::SyncOp`]s against the
//! annotation service, and feeds each outcome back so the core can reconcile
//! or roll back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EngineCore`] and the [`engine::Action`]s it emits |
//! | [`doc`] | Annotation records, colors, and the ordered in-memory store |
//! | [`input`] | Interaction modes and the gesture state machine |
//! | [`hit`] | Hit-testing annotations and manipulator handles |
//! | [`transform`] | Resize manipulator with minimum-size enforcement |
//! | [`sync`] | Optimistic-write reconciliation and failure policies |
//! | [`scene`] | Annotation id → render handle index |
//! | [`geom`] | Points and boxes |
//! | [`consts`] | Canvas size, minimum size, default colors |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod input;
pub mod scene;
pub mod sync;
pub mod transform;
