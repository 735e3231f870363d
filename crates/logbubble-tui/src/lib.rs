//! # logbubble-tui
//!
//! Terminal viewer for a [`logbubble_core`] store: a toggleable log panel
//! with category filtering, a virtualized row window that keeps redraw cost
//! bounded regardless of log volume, and an unread badge while collapsed.
//!
//! The host owns the event loop; it forwards key events to
//! [`LogConsole::handle_key`], calls [`LogConsole::poll`] once per tick to
//! drain store publications, and [`LogConsole::render`] inside its draw
//! closure.

pub mod console;
pub mod filter;
pub mod panel;
pub mod scroller;
pub mod theme;
pub mod view_model;

pub use console::LogConsole;
pub use filter::{FilterManager, LogFilter};
pub use scroller::{RenderWindow, RowPlacement, VirtualScroller};
pub use theme::Theme;
