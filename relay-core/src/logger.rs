//! Tracing initialisation and secret masking for log output.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan, fmt::writer::MakeWriterExt, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// Installs the global subscriber: `RUST_LOG` filter (default `info`), fmt layer with
/// level, target and span fields. When `log_file` is set, output goes to stdout and is
/// appended to that file as well.
///
/// Load `.env` before calling this, otherwise `RUST_LOG` from it is ignored.
pub fn init_tracing(log_file: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    let installed = match log_file {
        Some(path) => {
            if let Some(dir) = Path::new(path).parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = io::stdout.and(Arc::new(file));
            Registry::default()
                .with(env_filter)
                .with(base.with_writer(writer))
                .try_init()
        }
        None => Registry::default()
            .with(env_filter)
            .with(base.with_writer(io::stdout))
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}

/// Masks a secret for logging: first 4 chars + `***` + last 2. Short secrets become `***`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
