//! Shared setup of the `rc-cal` command line tools.
pub mod logging;
