use serde::Serialize;

/// What happened to one endpoint's fetch within a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Response decoded and written to the display state
    Applied,
    /// Fetch failed; the display keeps its previous values
    Failed(String),
    /// Response arrived after the activation it belonged to ended
    Discarded,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Outcome of one fetch cycle, per endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub soc: FetchOutcome,
    pub aggregates: FetchOutcome,
}

impl CycleReport {
    pub fn all_applied(&self) -> bool {
        self.soc.is_applied() && self.aggregates.is_applied()
    }
}
