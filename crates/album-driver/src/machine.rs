//! The polling state machine.
//!
//! One handler runs per driver iteration.  Each handler probes the page,
//! possibly queries the oracle and clicks something, then decides the next
//! state.  The bookkeeping of the two waiting states lives in the pure
//! functions [`await_start_transition`] and [`in_progress_transition`].
//!
//! ```text
//!   Idle               ──▶ TriggerDownload      (viewer and next button found)
//!   TriggerDownload    ──▶ AwaitDownloadStart   (download clicked)
//!                      ──▶ Idle                 (no file count within the retry budget)
//!   AwaitDownloadStart ──▶ DownloadInProgress   (partial file appeared)
//!                      ──▶ AdvanceToNext        (count went up)
//!                      ──▶ TriggerDownload      (retry budget spent)
//!   DownloadInProgress ──▶ AdvanceToNext        (count went up)
//!                      ──▶ TriggerDownload      (budget spent, or partial file vanished)
//!   AdvanceToNext      ──▶ TriggerDownload      (next clicked)
//! ```
//!
//! Every state but Idle falls back to Idle when the album viewer disappears.

use crate::info::{self, InfoOutcome};
use crate::oracle::{CompletionOracle, OracleError};
use crate::page::{AlbumPage, UiRole};
use crate::remote_log::LogSink;
use album_proto::protocol::{OracleReading, Severity};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

const IDLE_PAUSE: Duration = Duration::from_millis(2000);
const STEP_PAUSE: Duration = Duration::from_millis(500);
const ADVANCE_PAUSE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Idle,
    TriggerDownload,
    AwaitDownloadStart,
    DownloadInProgress,
    AdvanceToNext,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything the machine remembers between iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationContext {
    pub state: State,
    /// Oracle count captured right before the last download click.
    pub expected_files: u64,
    /// Polls spent in the current waiting phase.
    pub waits: u32,
    /// Name and date of the item being downloaded, for diagnostics only.
    pub last_description: String,
}

impl AutomationContext {
    fn enter(&mut self, state: State) {
        self.state = state;
        self.waits = 0;
    }
}

/// Outcome of one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Reading(OracleReading),
    /// The query failed; carries the error text.
    Unreachable(String),
}

impl From<Result<OracleReading, OracleError>> for Observation {
    fn from(result: Result<OracleReading, OracleError>) -> Self {
        match result {
            Ok(reading) => Observation::Reading(reading),
            Err(e) => Observation::Unreachable(e.to_string()),
        }
    }
}

pub type LogLine = (Severity, String);

/// Decides what a status poll means while waiting for the download to begin.
///
/// The in-progress marker moves on to [`State::DownloadInProgress`], a count
/// above the baseline is a finished download, and anything else (including a
/// failed query) spends one unit of the retry budget.
pub fn await_start_transition(
    mut ctx: AutomationContext,
    observation: Observation,
    retry_budget: u32,
) -> (AutomationContext, Vec<LogLine>) {
    let mut lines = observation_lines(&observation);

    match observation {
        Observation::Reading(OracleReading::InProgress) => {
            lines.push((Severity::Debug, "Download in progress. Waiting...".into()));
            ctx.enter(State::DownloadInProgress);
        }
        Observation::Reading(OracleReading::Files(n)) if n > ctx.expected_files => {
            lines.push((
                Severity::Info,
                "Download succeeded. Going to next image.".into(),
            ));
            ctx.enter(State::AdvanceToNext);
        }
        _ => {
            ctx.waits += 1;
            if ctx.waits > retry_budget {
                lines.push((
                    Severity::Error,
                    format!(
                        "{}: Timeout while waiting for download to start. Retrying to click it...",
                        ctx.last_description
                    ),
                ));
                ctx.enter(State::TriggerDownload);
            } else {
                lines.push((Severity::Debug, "Waiting for download to start...".into()));
            }
        }
    }

    (ctx, lines)
}

/// Decides what a status poll means while a download is being written.
///
/// A count above the baseline is success.  A count at or below it without
/// the in-progress marker means the partial file vanished, so the download
/// failed.  The marker itself, or a failed query, spends one unit of the
/// retry budget.
pub fn in_progress_transition(
    mut ctx: AutomationContext,
    observation: Observation,
    retry_budget: u32,
) -> (AutomationContext, Vec<LogLine>) {
    let mut lines = observation_lines(&observation);

    match observation {
        Observation::Reading(OracleReading::Files(n)) if n > ctx.expected_files => {
            lines.push((
                Severity::Info,
                "Download succeeded. Going to next image.".into(),
            ));
            ctx.enter(State::AdvanceToNext);
        }
        Observation::Reading(OracleReading::Files(_)) => {
            lines.push((
                Severity::Warning,
                "Download failed. Retrying to click it...".into(),
            ));
            ctx.enter(State::TriggerDownload);
        }
        Observation::Reading(OracleReading::InProgress) | Observation::Unreachable(_) => {
            ctx.waits += 1;
            if ctx.waits > retry_budget {
                lines.push((
                    Severity::Error,
                    format!(
                        "{}: Timeout while waiting for download to finish. Retrying to click it...",
                        ctx.last_description
                    ),
                ));
                ctx.enter(State::TriggerDownload);
            } else {
                lines.push((Severity::Debug, "Download in progress. Waiting...".into()));
            }
        }
    }

    (ctx, lines)
}

fn observation_lines(observation: &Observation) -> Vec<LogLine> {
    match observation {
        Observation::Reading(reading) => {
            vec![(Severity::Debug, format!("Currently got {} files", reading))]
        }
        Observation::Unreachable(e) => vec![(Severity::Warning, e.clone())],
    }
}

pub struct StateMachine<P, O, L> {
    page: P,
    oracle: O,
    log: L,
    retry_budget: u32,
    ctx: AutomationContext,
}

impl<P, O, L> StateMachine<P, O, L>
where
    P: AlbumPage,
    O: CompletionOracle,
    L: LogSink,
{
    pub fn new(page: P, oracle: O, log: L, retry_budget: u32) -> Self {
        Self {
            page,
            oracle,
            log,
            retry_budget,
            ctx: AutomationContext::default(),
        }
    }

    pub fn context(&self) -> &AutomationContext {
        &self.ctx
    }

    pub fn state(&self) -> State {
        self.ctx.state
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Runs the handler of the current state once, pauses included.
    pub async fn step(&mut self) {
        self.log.debug(self.ctx.state.to_string());
        match self.ctx.state {
            State::Idle => self.idle().await,
            State::TriggerDownload => self.trigger_download().await,
            State::AwaitDownloadStart => self.await_download_start().await,
            State::DownloadInProgress => self.download_in_progress().await,
            State::AdvanceToNext => self.advance_to_next().await,
        }
    }

    async fn idle(&mut self) {
        if self.page.present(UiRole::AlbumViewer).await
            && self.page.present(UiRole::NextTrigger).await
        {
            self.log
                .info("Found Album Viewer and Next Button. Starting download loop...");
            self.ctx.enter(State::TriggerDownload);
            sleep(STEP_PAUSE).await;
        } else {
            self.log.debug("Waiting for Album Viewer and Next Button...");
            sleep(IDLE_PAUSE).await;
        }
    }

    async fn trigger_download(&mut self) {
        if !self.viewer_present(Severity::Warning).await {
            return;
        }

        // While the click is held the panel has already been read.
        if self.ctx.waits == 0 {
            match info::extract_and_log(&self.page, &self.log).await {
                InfoOutcome::Described(description) => self.ctx.last_description = description,
                InfoOutcome::LeftOpen(description) => {
                    self.ctx.last_description = description;
                    self.ctx.enter(State::Idle);
                    return;
                }
                InfoOutcome::Skipped => {}
            }
        }

        if !self.page.present(UiRole::DownloadTrigger).await {
            self.fall_back(Severity::Warning, "Download Button not present. Going to Idle...");
            return;
        }

        match Observation::from(self.oracle.query().await) {
            Observation::Reading(OracleReading::Files(n)) => {
                self.log.info(format!("Starting download with {} files", n));
                self.ctx.expected_files = n;
            }
            Observation::Reading(OracleReading::InProgress) => {
                self.log
                    .warning("A previous download is still being written. Holding the click...");
                self.hold_click().await;
                return;
            }
            Observation::Unreachable(e) => {
                self.log.warning(format!("{}. Holding the click...", e));
                self.hold_click().await;
                return;
            }
        }

        sleep(STEP_PAUSE).await;

        if let Err(e) = self.page.click(UiRole::DownloadTrigger).await {
            self.fall_back(Severity::Warning, format!("{}. Going to Idle...", e));
            return;
        }

        self.ctx.enter(State::AwaitDownloadStart);
        sleep(STEP_PAUSE).await;
    }

    /// Spends one unit of the retry budget on a click held back for lack of
    /// a baseline count; past the budget the machine starts over from Idle.
    async fn hold_click(&mut self) {
        self.ctx.waits += 1;
        if self.ctx.waits > self.retry_budget {
            self.fall_back(
                Severity::Error,
                format!(
                    "{}: Timeout while waiting for a file count before downloading. Going to Idle...",
                    self.ctx.last_description
                ),
            );
        }
        sleep(STEP_PAUSE).await;
    }

    async fn await_download_start(&mut self) {
        if !self.viewer_present(Severity::Warning).await {
            return;
        }
        let observation = Observation::from(self.oracle.query().await);
        let ctx = std::mem::take(&mut self.ctx);
        let (ctx, lines) = await_start_transition(ctx, observation, self.retry_budget);
        self.ctx = ctx;
        self.emit(lines);
        sleep(STEP_PAUSE).await;
    }

    async fn download_in_progress(&mut self) {
        // Viewer loss is logged at debug here, unlike the other states.
        if !self.viewer_present(Severity::Debug).await {
            return;
        }
        let observation = Observation::from(self.oracle.query().await);
        let ctx = std::mem::take(&mut self.ctx);
        let (ctx, lines) = in_progress_transition(ctx, observation, self.retry_budget);
        self.ctx = ctx;
        self.emit(lines);
        sleep(STEP_PAUSE).await;
    }

    async fn advance_to_next(&mut self) {
        if !self.viewer_present(Severity::Warning).await {
            return;
        }
        if !self.page.present(UiRole::NextTrigger).await {
            self.fall_back(Severity::Warning, "Next Button not found. Going to Idle...");
            return;
        }
        if let Err(e) = self.page.click(UiRole::NextTrigger).await {
            self.fall_back(Severity::Warning, format!("{}. Going to Idle...", e));
            return;
        }

        self.ctx.enter(State::TriggerDownload);
        sleep(ADVANCE_PAUSE).await;
    }

    /// Falls back to Idle, logging at `severity`, when the viewer is gone.
    async fn viewer_present(&mut self, severity: Severity) -> bool {
        if self.page.present(UiRole::AlbumViewer).await {
            return true;
        }
        self.fall_back(severity, "Album Viewer not present. Going to Idle...");
        false
    }

    fn fall_back(&mut self, severity: Severity, message: impl Into<String>) {
        self.log.log(severity, message.into());
        self.ctx.enter(State::Idle);
    }

    fn emit(&self, lines: Vec<LogLine>) {
        for (severity, message) in lines {
            self.log.log(severity, message);
        }
    }
}
