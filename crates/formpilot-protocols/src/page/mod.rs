//! Page access protocol definitions.
//!
//! The engine never owns a browser session. It is handed a live
//! [`PageAccessor`] for the active tab and talks to elements through
//! [`PageElement`] handles.

mod traits;

pub use traits::*;
