//! Viewport-adaptive geospatial clustering and data-radius control.
//!
//! The hard problem here is not drawing markers — it is deciding what to
//! fetch, at what radius, how to group it, and which subset to show while
//! the user pans, zooms, searches, and deep-links continuously. Panning
//! must not trigger fetch storms, zooming must bound marker counts, and a
//! cross-continent search jump must not be treated like a small pan.
//!
//! All mutable state lives in a single controller task ([`controller`]);
//! the other modules are pure state machines and functions it drives.

pub mod cluster;
pub mod controller;
pub mod debounce;
pub mod events;
pub mod filter;
pub mod loading;
pub mod navigate;
pub mod proximity;
pub mod radius;
pub mod timeframe;

pub use controller::{spawn, ControllerHandle};
pub use events::{ControllerEvent, DisplayedItem, RenderFrame};
pub use radius::{RadiusController, RadiusDecision};
