//! Character sheet operations: dot-path addressing, patching, diffing and
//! prompt formatting.

mod diff;
mod format;
mod patch;
mod path;

pub use diff::{diff, diff_values, to_updates, SheetChange};
pub use format::format_sheet;
pub use patch::{apply_updates, apply_updates_with_report, PatchError, PatchReport, RejectedUpdate};
pub use path::{humanize_key, SheetPath, SheetUpdate, SheetUpdates};
