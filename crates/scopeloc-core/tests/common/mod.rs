#![allow(dead_code)]

use log::{Level, Log, Metadata, Record};
use parking_lot::Mutex;
use std::sync::Arc;

use scopeloc_core::{LocatorConfig, MemoryHost, ScopeTree, Services};

/// Records every severity/message pair it is handed.
#[derive(Default)]
pub struct CaptureLog {
    records: Mutex<Vec<(Level, String)>>,
}

impl CaptureLog {
    pub fn count(&self, level: Level) -> usize {
        self.records.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Log for CaptureLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.records
            .lock()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

pub struct CaptureServices(pub Arc<CaptureLog>);

impl Services for CaptureServices {
    fn logger(&self) -> &dyn Log {
        self.0.as_ref()
    }
}

pub struct Fixture {
    pub host: Arc<MemoryHost>,
    pub tree: ScopeTree,
    pub log: Arc<CaptureLog>,
}

pub fn fixture() -> Fixture {
    fixture_with(LocatorConfig {
        verbose: true,
        ..LocatorConfig::default()
    })
}

pub fn fixture_with(config: LocatorConfig) -> Fixture {
    let host = Arc::new(MemoryHost::new());
    let log = Arc::new(CaptureLog::default());
    let tree = ScopeTree::new(host.clone(), Box::new(CaptureServices(log.clone())), config);
    Fixture { host, tree, log }
}

pub trait AppLog: Send + Sync {
    fn tag(&self) -> &str;
}

pub struct TaggedLog(pub &'static str);

impl AppLog for TaggedLog {
    fn tag(&self) -> &str {
        self.0
    }
}

pub trait Feature: Send + Sync {
    fn level(&self) -> u32;
}

pub struct LevelFeature(pub u32);

impl Feature for LevelFeature {
    fn level(&self) -> u32 {
        self.0
    }
}

pub fn app_log(tag: &'static str) -> Arc<dyn AppLog> {
    Arc::new(TaggedLog(tag))
}

pub fn feature(level: u32) -> Arc<dyn Feature> {
    Arc::new(LevelFeature(level))
}
