use substrate_core::EntryType;

/// Filter options for [`crate::Session::trajectory`].
///
/// All fields are optional; the default query returns the whole trajectory.
/// `limit` truncates newest-first (the returned slice is still ascending by
/// `seq_num`), `since_seq` keeps entries with `seq_num` strictly greater.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryQuery {
    pub limit: Option<usize>,
    pub since_seq: Option<u64>,
    pub entry_type: Option<EntryType>,
}

impl TrajectoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, seq_num: u64) -> Self {
        self.since_seq = Some(seq_num);
        self
    }

    pub fn of_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }
}
