//! Tracing subscriber and panic forwarding.

use std::{
    backtrace::Backtrace,
    io::{self, Write},
    panic::{self, PanicHookInfo},
    sync::Once,
    thread,
};

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, FormatEvent, FormatFields, format::Writer, writer::MakeWriter},
    prelude::*,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "TRELLIS_LOG";

const TRACING_PREFIX: &str = "[trellis]";
const DEFAULT_FILTER: &str = "info";
const MAX_PANIC_LINES: usize = 8;

static PANIC_HOOK_INSTALLED: Once = Once::new();
static TRACING_INSTALLED: Once = Once::new();

/// Installs a stderr subscriber filtered by [`LOG_ENV`] (idempotent).
pub fn install_tracing() {
    TRACING_INSTALLED.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let console = fmt::layer()
            .event_format(PanicAwareFormatter)
            .with_writer(PrefixedWriter)
            .with_ansi(false)
            .with_filter(filter);

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            eprintln!("{TRACING_PREFIX} a global tracing subscriber is already installed");
        }
    });
}

/// Logs panics through tracing before handing them to the previous hook
/// (idempotent).
pub fn install_panic_forwarder() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            forward_panic(info);
            previous(info);
        }));
    });
}

fn forward_panic(info: &PanicHookInfo<'_>) {
    let message = panic_message(info);
    let thread_name = thread::current().name().unwrap_or("unnamed").to_string();
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_default();
    let backtrace = Backtrace::capture().to_string();

    tracing::error!(
        target: "trellis::panic",
        message = %message,
        thread = %thread_name,
        location = %location,
        backtrace = %backtrace
    );
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PrefixedWriter;

impl<'a> MakeWriter<'a> for PrefixedWriter {
    type Writer = PrefixedWriterInner<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixedWriterInner {
            inner: io::stderr(),
            wrote_prefix: false,
        }
    }
}

#[derive(Debug)]
struct PrefixedWriterInner<W> {
    inner: W,
    wrote_prefix: bool,
}

impl<W: Write> Write for PrefixedWriterInner<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_prefix {
            self.inner.write_all(TRACING_PREFIX.as_bytes())?;
            self.inner.write_all(b" ")?;
            self.wrote_prefix = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Formats panics with a truncated backtrace and everything else as
/// `LEVEL target: fields`.
#[derive(Debug, Clone, Copy, Default)]
struct PanicAwareFormatter;

impl<S, N> FormatEvent<S, N> for PanicAwareFormatter
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let target = event.metadata().target();
        if target.ends_with("::panic") {
            let mut visitor = PanicFieldVisitor::default();
            event.record(&mut visitor);
            write!(writer, "PANIC: {}", visitor.message.as_deref().unwrap_or("panic"))?;
            if let Some(location) = visitor.location.as_deref().filter(|l| !l.is_empty()) {
                write!(writer, " at {location}")?;
            }
            if let Some(backtrace) = visitor.backtrace.as_deref() {
                write!(writer, "\nStack:")?;
                for line in backtrace.lines().take(MAX_PANIC_LINES) {
                    write!(writer, "\n  {line}")?;
                }
                if backtrace.lines().count() > MAX_PANIC_LINES {
                    write!(writer, "\n  ... (truncated)")?;
                }
            }
            writeln!(writer)
        } else {
            let level = event.metadata().level();
            write!(writer, "{level} {target}: ")?;
            ctx.field_format().format_fields(writer.by_ref(), event)?;
            writeln!(writer)
        }
    }
}

#[derive(Debug, Default)]
struct PanicFieldVisitor {
    message: Option<String>,
    location: Option<String>,
    backtrace: Option<String>,
}

impl PanicFieldVisitor {
    fn store(&mut self, field: &str, value: String) {
        match field {
            "message" => self.message = Some(value),
            "location" => self.location = Some(value),
            "backtrace" => self.backtrace = Some(value),
            _ => {}
        }
    }
}

impl tracing::field::Visit for PanicFieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.store(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.store(field.name(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installation_is_idempotent() {
        install_tracing();
        install_tracing();
        install_panic_forwarder();
        install_panic_forwarder();
        assert!(TRACING_INSTALLED.is_completed());
        assert!(PANIC_HOOK_INSTALLED.is_completed());
    }

    #[test]
    fn writer_prefixes_once() {
        let mut writer = PrefixedWriterInner {
            inner: Vec::new(),
            wrote_prefix: false,
        };
        writer.write_all(b"INFO a: b").expect("write");
        writer.write_all(b"\n").expect("write");
        assert_eq!(writer.inner, b"[trellis] INFO a: b\n");
    }

    #[test]
    fn panic_fields_are_collected() {
        let mut visitor = PanicFieldVisitor::default();
        visitor.store("message", "boom".into());
        visitor.store("thread", "main".into());
        assert_eq!(visitor.message.as_deref(), Some("boom"));
        assert!(visitor.location.is_none());
    }
}
