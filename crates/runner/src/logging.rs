//! Logging setup: console output plus one human-readable file per account.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use groupforge_core::account::file_stem;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Name of the span that scopes everything done on behalf of one account.
const ACCOUNT_SPAN: &str = "account";

/// Install the global subscriber.
pub fn init(logs_dir: &Path) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(AccountLogLayer::new(logs_dir))
        .try_init()?;
    Ok(())
}

/// tracing Layer that appends events inside an `account` span to
/// `<logs_dir>/<account stem>.log`.
pub struct AccountLogLayer {
    dir: PathBuf,
    files: Mutex<HashMap<String, File>>,
}

impl AccountLogLayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Mutex::new(HashMap::new()),
        }
    }

    fn write_line(&self, account: &str, line: &str) {
        let mut files = match self.files.lock() {
            Ok(files) => files,
            Err(poisoned) => poisoned.into_inner(),
        };

        if !files.contains_key(account) {
            match self.open(account) {
                Ok(file) => {
                    files.insert(account.to_string(), file);
                }
                Err(e) => {
                    // Can't log through tracing from inside a layer.
                    eprintln!("Failed to open log file for account {}: {}", account, e);
                    return;
                }
            }
        }

        if let Some(file) = files.get_mut(account) {
            let _ = writeln!(file, "{}", line);
        }
    }

    fn open(&self, account: &str) -> std::io::Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(format!("{}.log", file_stem(account))))
    }
}

/// Account name stored on the `account` span.
struct AccountName(String);

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    account: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "account" => self.account = Some(value),
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }
}

impl<S> Layer<S> for AccountLogLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != ACCOUNT_SPAN {
            return;
        }

        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        if let (Some(account), Some(span)) = (visitor.account, ctx.span(id)) {
            span.extensions_mut().insert(AccountName(account));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let account = ctx.event_scope(event).and_then(|scope| {
            scope
                .from_root()
                .find_map(|span| span.extensions().get::<AccountName>().map(|a| a.0.clone()))
        });
        let Some(account) = account else {
            return;
        };

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut line = format!(
            "[{}] [{}] [{}] {}",
            Local::now().format("%d-%m-%Y | %H:%M:%S"),
            event.metadata().level(),
            account,
            visitor.message.unwrap_or_default()
        );
        if !visitor.fields.is_empty() {
            let fields: Vec<String> = visitor
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            line.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        self.write_line(&account, &line);
    }
}
