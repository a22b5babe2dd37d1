use log::{Level, Metadata, Record};
use std::fmt;

pub const LOG_TARGET: &str = "scopeloc";

/// Locator-wide infrastructure supplied by the host application.
///
/// The tree never decides how its diagnostics are displayed; it hands
/// severity-tagged records to this logger.
pub trait Services: Send + Sync {
    fn logger(&self) -> &dyn log::Log;
}

/// Forwards to whatever logger the process installed through the `log` facade.
pub struct DefaultServices;

impl DefaultServices {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultServices {
    fn default() -> Self {
        Self::new()
    }
}

impl Services for DefaultServices {
    #[inline(always)]
    fn logger(&self) -> &dyn log::Log {
        log::logger()
    }
}

/// Severity-tagged emitter over an injected logger.
///
/// Info records are dropped unless `verbose` is set.
#[derive(Clone, Copy)]
pub(crate) struct Diag<'a> {
    logger: &'a dyn log::Log,
    verbose: bool,
}

impl<'a> Diag<'a> {
    #[inline]
    pub(crate) fn new(logger: &'a dyn log::Log, verbose: bool) -> Self {
        Self { logger, verbose }
    }

    #[inline]
    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            self.emit(Level::Info, args);
        }
    }

    #[inline]
    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    #[inline]
    pub(crate) fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let meta = Metadata::builder().level(level).target(LOG_TARGET).build();
        if !self.logger.enabled(&meta) {
            return;
        }
        self.logger.log(
            &Record::builder()
                .metadata(meta)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }
}
