//! Config Surface (C8): re-exports the nudge engine's configuration record,
//! the only piece of this crate with user-facing tunables.

pub use crate::nudge::{deep_merge, NudgeConfig, QuietHours};
