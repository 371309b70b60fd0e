//! Router Module Index
//!
//! The HTTP surface is split by access level, mirroring the guard outcomes.
//! Portal pages are not listed here: they are served by the fallback handler,
//! which resolves every other path through the navigation tree.

/// Routes open to every caller. Handlers still see the session and answer
/// relative to it, but never reject.
pub mod public;

/// Routes behind the `AuthUser` extractor: `401` for anonymous callers.
pub mod authenticated;

/// Routes gated on the `admin` role through the Route Guard.
pub mod admin;
