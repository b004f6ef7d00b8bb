use serde::Serialize;

use crate::aggregate::{AggregationResult, RankedEntry};
use crate::controller::{ChartController, ChartState, FetchOutcome, SaveOutcome, Status};
use crate::domain::{Dataset, DatasetKind, Identifier, sample_dataset};
use crate::entry::EntryParser;
use crate::error::CalldeckError;
use crate::remote::DatasetClient;

/// What the presentation layer consumes: the ranked series, the grand
/// total, and the status line, in one serializable view.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub kind: DatasetKind,
    pub identifier: Option<String>,
    pub status: String,
    pub series: Vec<RankedEntry>,
    pub total: u64,
}

impl ChartSnapshot {
    pub fn new(
        kind: DatasetKind,
        identifier: Option<&Identifier>,
        status: Status,
        aggregation: &AggregationResult,
    ) -> Self {
        Self {
            kind,
            identifier: identifier.map(|id| id.as_str().to_string()),
            status: status.as_str().to_string(),
            series: aggregation.series.clone(),
            total: aggregation.total,
        }
    }
}

/// Caller-facing surface for one chart: wires the entry parser, the remote
/// gateway and the controller together, driving each remote request to
/// completion before returning.
pub struct App<C: DatasetClient> {
    client: C,
    parser: EntryParser,
    controller: ChartController,
}

impl<C: DatasetClient> App<C> {
    pub fn new(client: C, parser: EntryParser, kind: DatasetKind) -> Self {
        Self::with_initial(client, parser, kind, sample_dataset(kind))
    }

    /// Same as `new` but with an explicit initial dataset instead of the
    /// built-in sample.
    pub fn with_initial(
        client: C,
        parser: EntryParser,
        kind: DatasetKind,
        initial: Dataset,
    ) -> Self {
        Self {
            client,
            parser,
            controller: ChartController::new(kind, initial),
        }
    }

    /// Validates the email-shaped identifier, fetches its stored dataset
    /// and applies the outcome. A transport failure lands the controller
    /// in the error state and is also returned to the caller.
    pub fn set_identifier(&mut self, raw: &str) -> Result<(), CalldeckError> {
        let identifier: Identifier = raw.parse()?;
        let ticket = self.controller.set_identifier(identifier);
        match self.client.fetch(ticket.identifier(), ticket.kind()) {
            Ok(values) => {
                self.controller
                    .apply_fetch(&ticket, FetchOutcome::from(values));
                Ok(())
            }
            Err(err) => {
                self.controller
                    .apply_fetch(&ticket, FetchOutcome::TransportFailed);
                Err(err)
            }
        }
    }

    /// Parses the raw text and upserts the entries for the current
    /// identifier. On success returns the pairs the permissive policy
    /// ignored (always empty under the strict policy). On any failure the
    /// prior dataset stays in place.
    pub fn submit_raw_entries(&mut self, raw: &str) -> Result<Vec<String>, CalldeckError> {
        let parsed = match self.parser.parse(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.controller.note_parse_failure();
                return Err(err);
            }
        };

        let ticket = self.controller.begin_save(parsed.entries)?;
        match self
            .client
            .save(ticket.identifier(), ticket.kind(), ticket.values())
        {
            Ok(()) => {
                self.controller.apply_save(ticket, SaveOutcome::Saved);
                Ok(parsed.ignored)
            }
            Err(err) => {
                self.controller.apply_save(ticket, SaveOutcome::TransportFailed);
                Err(err)
            }
        }
    }

    pub fn aggregation(&self) -> &AggregationResult {
        self.controller.aggregation()
    }

    pub fn state(&self) -> ChartState {
        self.controller.state()
    }

    pub fn status(&self) -> Status {
        self.controller.status()
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.controller.identifier()
    }

    /// Current dataset rendered back to the text exchange format, used to
    /// pre-fill the edit surface.
    pub fn dataset_text(&self) -> String {
        EntryParser::render(self.controller.dataset())
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot::new(
            self.controller.kind(),
            self.controller.identifier(),
            self.controller.status(),
            self.controller.aggregation(),
        )
    }
}
