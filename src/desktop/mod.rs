//! Desktop entries
//!
//! Parsing of `.desktop` files, lookup by application id in the XDG data
//! directories, and expansion of `Exec` command lines.

mod entry;
mod exec;
mod lookup;

pub use entry::{
    locale_candidates, normalize_id, parse_bool, split_list, DesktopEntry,
    DESKTOP_ENTRY_SECTION, DESKTOP_SUFFIX,
};
pub use exec::{expand_exec, split_exec, to_local_path};
pub use lookup::{DesktopEntryDirs, EntryLookup};
