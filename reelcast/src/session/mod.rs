//! Transport, clock and the per-project render session.

pub mod clock;
pub mod export;
pub mod render_session;
pub mod transport;
