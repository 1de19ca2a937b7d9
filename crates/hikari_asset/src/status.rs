#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    /// Queued, no worker has picked it up yet
    Pending,
    Loading,
    Loaded,
    Failed,
}

impl LoadStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadStatus::Loaded | LoadStatus::Failed)
    }
    pub fn is_in_flight(&self) -> bool {
        !self.is_settled()
    }
}
