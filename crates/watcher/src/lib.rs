//! Directory watching for Vigil
//!
//! Turns a noisy stream of filesystem events into a bounded rate of backup
//! runs. Events are filtered (hidden files, editor temp files, excluded
//! names), debounced until the change stream goes quiet, and throttled to a
//! minimum interval between runs. At most one backup executes per session
//! at any time.

pub mod debounce;
pub mod event;
pub mod filter;
pub mod notifier;
pub mod session;
pub mod supervisor;

pub use debounce::{Debouncer, FireOutcome, Phase};
pub use event::{ChangeEvent, ChangeKind};
pub use filter::EventFilter;
pub use notifier::{ChangeNotifier, NotifyWatcher, WatchError, WatchHandle};
pub use session::{WatchConfig, WatchSession};
pub use supervisor::{run_for, run_until_signaled};

pub type Result<T> = anyhow::Result<T>;
