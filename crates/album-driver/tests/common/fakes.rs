#![allow(dead_code)]

use album_driver::oracle::{CompletionOracle, OracleError};
use album_driver::page::{AlbumPage, PageError, UiRole};
use album_driver::remote_log::LogSink;
use album_proto::protocol::{OracleReading, Severity};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const ALL_ROLES: [UiRole; 5] = [
    UiRole::AlbumViewer,
    UiRole::DownloadTrigger,
    UiRole::NextTrigger,
    UiRole::InfoTrigger,
    UiRole::InfoClose,
];

/// Scriptable album page.  Clicking the download trigger bumps `downloads`.
#[derive(Default)]
pub struct FakePage {
    present: Mutex<HashSet<UiRole>>,
    clicks: Mutex<Vec<UiRole>>,
    fields: Mutex<Vec<String>>,
    pub downloads: Arc<AtomicU64>,
}

impl FakePage {
    /// A viewer showing an item with every control available.
    pub fn viewer(name: &str, date: &str) -> Self {
        let page = Self::default();
        for role in ALL_ROLES {
            page.show(role);
        }
        page.set_fields(&[name, date]);
        page
    }

    pub fn show(&self, role: UiRole) {
        self.present.lock().unwrap().insert(role);
    }

    pub fn hide(&self, role: UiRole) {
        self.present.lock().unwrap().remove(&role);
    }

    pub fn set_fields(&self, fields: &[&str]) {
        *self.fields.lock().unwrap() = fields.iter().map(|s| s.to_string()).collect();
    }

    pub fn clicks(&self) -> Vec<UiRole> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn click_count(&self, role: UiRole) -> usize {
        self.clicks().iter().filter(|r| **r == role).count()
    }
}

#[async_trait]
impl AlbumPage for FakePage {
    async fn present(&self, role: UiRole) -> bool {
        self.present.lock().unwrap().contains(&role)
    }

    async fn click(&self, role: UiRole) -> Result<(), PageError> {
        if !self.present.lock().unwrap().contains(&role) {
            return Err(PageError::Missing(role));
        }
        self.clicks.lock().unwrap().push(role);
        if role == UiRole::DownloadTrigger {
            self.downloads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn field_texts(&self) -> Vec<String> {
        self.fields.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    Reading(OracleReading),
    Down,
}

pub fn files(n: u64) -> Scripted {
    Scripted::Reading(OracleReading::Files(n))
}

pub fn dip() -> Scripted {
    Scripted::Reading(OracleReading::InProgress)
}

enum Mode {
    /// Plays the script; the last entry repeats forever.
    Script(VecDeque<Scripted>),
    /// Reports `base` plus every download click seen by the page.
    Live { base: u64, downloads: Arc<AtomicU64> },
}

pub struct FakeOracle {
    mode: Mutex<Mode>,
    queries: AtomicU64,
}

impl FakeOracle {
    pub fn script(readings: &[Scripted]) -> Self {
        assert!(!readings.is_empty());
        Self {
            mode: Mutex::new(Mode::Script(readings.iter().copied().collect())),
            queries: AtomicU64::new(0),
        }
    }

    pub fn live(base: u64, page: &FakePage) -> Self {
        Self {
            mode: Mutex::new(Mode::Live {
                base,
                downloads: page.downloads.clone(),
            }),
            queries: AtomicU64::new(0),
        }
    }

    /// Replaces whatever is left of the script.
    pub fn then(&self, readings: &[Scripted]) {
        *self.mode.lock().unwrap() = Mode::Script(readings.iter().copied().collect());
    }

    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionOracle for FakeOracle {
    async fn query(&self) -> Result<OracleReading, OracleError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let next = match &mut *self.mode.lock().unwrap() {
            Mode::Script(script) => {
                if script.len() > 1 {
                    script.pop_front().unwrap()
                } else {
                    script[0]
                }
            }
            Mode::Live { base, downloads } => {
                files(*base + downloads.load(Ordering::SeqCst))
            }
        };
        match next {
            Scripted::Reading(reading) => Ok(reading),
            Scripted::Down => Err(OracleError::Status(503)),
        }
    }
}

#[derive(Default)]
pub struct FakeLog {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl FakeLog {
    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn has(&self, severity: Severity, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(s, m)| *s == severity && m.contains(needle))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lines().iter().filter(|(s, _)| *s == severity).count()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

impl LogSink for FakeLog {
    fn log(&self, severity: Severity, message: String) {
        self.lines.lock().unwrap().push((severity, message));
    }
}
