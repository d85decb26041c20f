/// Per-store open options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Fail `open` on a truncated or unreadable key-log record instead of
    /// silently dropping the tail. Off by default: an interrupted append
    /// legitimately leaves a short record behind, and dropping it recovers
    /// the log to its last complete write.
    pub strict_replay: bool,
}

impl Options {
    /// Options with strict replay enabled, for auditing a log that should
    /// contain no partial writes.
    pub fn strict() -> Self {
        Self {
            strict_replay: true,
        }
    }
}
