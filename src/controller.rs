use std::fmt;

use tracing::debug;

use crate::aggregate::{AggregationResult, aggregate};
use crate::domain::{CategoryCount, Dataset, DatasetKind, Identifier};
use crate::error::CalldeckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartState {
    /// Built-in sample dataset, no identifier assigned yet.
    Default,
    /// A fetch for the current identifier is outstanding.
    Loading,
    /// Custom data for the current identifier is live.
    Loaded,
    /// No custom data exists for the current identifier.
    Empty,
    /// The last fetch for the current identifier failed in transport.
    Error,
}

/// Caller-visible status line. Unlike `ChartState` this also carries
/// failure notices (parse, save) that do not move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Default,
    Loading,
    Loaded,
    Empty,
    ParseError,
    TransportError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Default => "default",
            Status::Loading => "loading",
            Status::Loaded => "loaded",
            Status::Empty => "empty",
            Status::ParseError => "parse-error",
            Status::TransportError => "transport-error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tag for an outstanding fetch. Carries the identifier the request was
/// issued for and its issue sequence; results are applied only while both
/// still match the controller's view.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    identifier: Identifier,
    kind: DatasetKind,
    seq: u64,
}

impl FetchTicket {
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }
}

#[derive(Debug, Clone)]
pub struct SaveTicket {
    identifier: Identifier,
    kind: DatasetKind,
    values: Dataset,
    seq: u64,
}

impl SaveTicket {
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn values(&self) -> &[CategoryCount] {
        &self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The result belongs to a request that is no longer current; it is
    /// discarded without touching dataset, state, or status.
    Stale,
}

/// Classified result of a gateway fetch, fed back into the controller by
/// the caller that performed the remote call.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Found(Dataset),
    Missing,
    TransportFailed,
}

impl From<Option<Dataset>> for FetchOutcome {
    fn from(values: Option<Dataset>) -> Self {
        match values {
            Some(values) => FetchOutcome::Found(values),
            None => FetchOutcome::Missing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    TransportFailed,
}

/// Single owner of the dataset/aggregation pair. All I/O happens in the
/// caller: the controller issues tickets, the caller performs the remote
/// operation and feeds the outcome back through `apply_fetch`/`apply_save`.
///
/// Ordering is by issuance time of the request, not completion time: only
/// the most recently issued request may apply its result, so a slow fetch
/// can never overwrite a save (or a fetch for a newer identifier) that was
/// issued after it.
pub struct ChartController {
    kind: DatasetKind,
    identifier: Option<Identifier>,
    dataset: Dataset,
    state: ChartState,
    status: Status,
    aggregation: AggregationResult,
    last_issued_seq: u64,
}

impl ChartController {
    pub fn new(kind: DatasetKind, initial: Dataset) -> Self {
        let aggregation = aggregate(&initial);
        Self {
            kind,
            identifier: None,
            dataset: initial,
            state: ChartState::Default,
            status: Status::Default,
            aggregation,
            last_issued_seq: 0,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn state(&self) -> ChartState {
        self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn dataset(&self) -> &[CategoryCount] {
        &self.dataset
    }

    pub fn aggregation(&self) -> &AggregationResult {
        &self.aggregation
    }

    /// Assigns the identifier and issues a fetch for it. The previous
    /// dataset stays visible while the fetch is outstanding; any earlier
    /// outstanding request becomes stale immediately.
    pub fn set_identifier(&mut self, identifier: Identifier) -> FetchTicket {
        self.identifier = Some(identifier.clone());
        self.state = ChartState::Loading;
        self.status = Status::Loading;
        FetchTicket {
            identifier,
            kind: self.kind,
            seq: self.next_seq(),
        }
    }

    pub fn apply_fetch(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> ApplyOutcome {
        if !self.is_current(ticket.seq, &ticket.identifier) {
            debug!(identifier = %ticket.identifier, "discarding stale fetch result");
            return ApplyOutcome::Stale;
        }

        match outcome {
            FetchOutcome::Found(values) if !values.is_empty() => {
                self.dataset = values;
                self.state = ChartState::Loaded;
                self.status = Status::Loaded;
            }
            // An existing record with empty values means the same thing as
            // no record at all: no custom data for this identifier.
            FetchOutcome::Found(_) | FetchOutcome::Missing => {
                self.dataset = Vec::new();
                self.state = ChartState::Empty;
                self.status = Status::Empty;
            }
            FetchOutcome::TransportFailed => {
                self.dataset = Vec::new();
                self.state = ChartState::Error;
                self.status = Status::TransportError;
            }
        }
        self.aggregation = aggregate(&self.dataset);
        ApplyOutcome::Applied
    }

    /// Issues a save for already-validated entries. Requires an identifier;
    /// the dataset is not touched until the save is confirmed applied.
    pub fn begin_save(&mut self, values: Dataset) -> Result<SaveTicket, CalldeckError> {
        let identifier = self
            .identifier
            .clone()
            .ok_or(CalldeckError::MissingIdentifier)?;
        Ok(SaveTicket {
            identifier,
            kind: self.kind,
            values,
            seq: self.next_seq(),
        })
    }

    pub fn apply_save(&mut self, ticket: SaveTicket, outcome: SaveOutcome) -> ApplyOutcome {
        if !self.is_current(ticket.seq, &ticket.identifier) {
            debug!(identifier = %ticket.identifier, "discarding stale save result");
            return ApplyOutcome::Stale;
        }

        match outcome {
            SaveOutcome::Saved => {
                self.dataset = ticket.values;
                self.state = ChartState::Loaded;
                self.status = Status::Loaded;
                self.aggregation = aggregate(&self.dataset);
            }
            SaveOutcome::TransportFailed => {
                // The prior dataset and state stay in place; only the
                // status line changes.
                self.status = Status::TransportError;
            }
        }
        ApplyOutcome::Applied
    }

    /// Records a validation failure without moving the state machine. The
    /// prior dataset and aggregation stay in place.
    pub fn note_parse_failure(&mut self) {
        self.status = Status::ParseError;
    }

    fn next_seq(&mut self) -> u64 {
        self.last_issued_seq += 1;
        self.last_issued_seq
    }

    fn is_current(&self, seq: u64, identifier: &Identifier) -> bool {
        self.identifier.as_ref() == Some(identifier) && seq == self.last_issued_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryCount, sample_dataset};

    fn controller() -> ChartController {
        ChartController::new(
            DatasetKind::CallAnalysis,
            sample_dataset(DatasetKind::CallAnalysis),
        )
    }

    #[test]
    fn starts_with_sample() {
        let controller = controller();
        assert_eq!(controller.state(), ChartState::Default);
        assert_eq!(controller.status(), Status::Default);
        assert!(controller.aggregation().total > 0);
    }

    #[test]
    fn fetch_not_found_goes_empty() {
        let mut controller = controller();
        let ticket = controller.set_identifier("x@y.com".parse().unwrap());
        assert_eq!(controller.state(), ChartState::Loading);

        let outcome = controller.apply_fetch(&ticket, FetchOutcome::Missing);
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(controller.state(), ChartState::Empty);
        assert!(controller.dataset().is_empty());
        assert_eq!(controller.aggregation().total, 0);
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut controller = controller();
        let first = controller.set_identifier("a@x.com".parse().unwrap());
        let second = controller.set_identifier("b@x.com".parse().unwrap());

        let late = controller.apply_fetch(
            &first,
            FetchOutcome::Found(vec![CategoryCount::new("From a", 1)]),
        );
        assert_eq!(late, ApplyOutcome::Stale);
        assert_eq!(controller.state(), ChartState::Loading);

        let current = controller.apply_fetch(
            &second,
            FetchOutcome::Found(vec![CategoryCount::new("From b", 2)]),
        );
        assert_eq!(current, ApplyOutcome::Applied);
        assert_eq!(controller.dataset()[0].category, "From b");
    }

    #[test]
    fn parse_failure_only_touches_status() {
        let mut controller = controller();
        let before = controller.dataset().to_vec();
        controller.note_parse_failure();
        assert_eq!(controller.status(), Status::ParseError);
        assert_eq!(controller.state(), ChartState::Default);
        assert_eq!(controller.dataset(), before.as_slice());
    }
}
