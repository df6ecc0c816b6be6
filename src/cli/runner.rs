//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, SimulateArgs};
use crate::config::{PagerConfig, PagerOptions, FALLBACK_PAGE_SIZE};
use crate::error::{Error, Result, ResultExt};
use crate::pagination::Cursor;
use crate::ports::Collection;
use crate::runtime::{Callbacks, Pager, PagerPorts};
use crate::sim::{MemoryBackend, MemoryCollection, SimulatedViewport};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Simulate(args) => self.simulate(args).await,
            Commands::Validate => self.validate(),
            Commands::Params {
                page,
                collection_len,
                last_item,
            } => self.params(*page, *collection_len, last_item.as_deref()),
        }
    }

    /// Load the configuration file, or defaults when none is given
    fn load_config(&self) -> Result<PagerConfig> {
        match &self.cli.config {
            Some(path) => PagerConfig::from_file(path),
            None => Ok(PagerConfig::default()),
        }
    }

    /// Validate the configuration file
    fn validate(&self) -> Result<()> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        let options = PagerOptions::new(PagerConfig::from_file(path)?);
        options.validate()?;

        let builder = options.param_builder(options.resolve_page_size(0));
        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Config '{}' is valid: {:?} cursor, {} exhaustion",
                    path.display(),
                    builder.cursor_kind(),
                    options.policy().name()
                )
            }
        }));

        Ok(())
    }

    /// Print the parameter map for one page
    fn params(&self, page: u32, collection_len: usize, last_item: Option<&str>) -> Result<()> {
        let options = PagerOptions::new(self.load_config()?);
        options.validate()?;

        let items = match last_item {
            Some(raw) => {
                vec![serde_json::from_str::<Value>(raw).context("--last-item is not valid JSON")?]
            }
            None => Vec::new(),
        };
        let collection = MemoryCollection::with_items(items);

        let page_size = options.resolve_page_size(collection_len);
        let builder = options.param_builder(page_size);
        let cursor = Cursor::new(builder.cursor_kind(), page);

        let Some(params) = builder.build(&cursor, &collection) else {
            return Err(Error::config(
                "Key mode needs --last-item with a key to build parameters",
            ));
        };

        self.output_message(&json!({
            "type": "PARAMS",
            "page": page,
            "page_size": page_size,
            "cursor": builder.cursor_kind(),
            "params": params,
        }));

        Ok(())
    }

    /// Drive a pager over in-memory adapters
    async fn simulate(&self, args: &SimulateArgs) -> Result<()> {
        let mut config = self.load_config()?;
        let page_size = config.page_size.unwrap_or(FALLBACK_PAGE_SIZE);
        config.page_size = Some(page_size);

        let dataset: Vec<Value> = (0..args.items)
            .map(|id| json!({"id": id, "title": format!("Item {id}")}))
            .collect();
        let preloaded = (page_size as usize * config.initial_pages as usize).min(dataset.len());

        let collection = Arc::new(MemoryCollection::with_items(dataset[..preloaded].to_vec()));
        let viewport = Arc::new(SimulatedViewport::tracking(
            Arc::clone(&collection),
            args.item_height,
            args.viewport,
        ));
        let backend = Arc::new(
            MemoryBackend::new(Arc::clone(&collection), dataset)
                .with_param_names(config.params.clone())
                .with_key_field(config.key_field.clone().unwrap_or_else(|| "id".to_string()))
                .with_default_limit(page_size as usize)
                .with_latency(Duration::from_millis(args.latency_ms))
                .with_sync_notifications(),
        );
        backend.fail_next(args.fail_first);

        let format = self.cli.format;
        let fetches = Arc::new(AtomicU32::new(0));
        let callbacks = {
            let fetches = Arc::clone(&fetches);
            let collection = Arc::clone(&collection);
            Callbacks::new()
                .on_success(move |response| {
                    let n = fetches.fetch_add(1, Ordering::SeqCst) + 1;
                    emit(
                        format,
                        &json!({
                            "type": "FETCH",
                            "fetch": n,
                            "items": response.items.len(),
                            "collection_len": collection.len(),
                            "has_more": response.raw.get("has_more"),
                        }),
                    );
                })
                .on_error(move |err| {
                    emit(
                        format,
                        &json!({
                            "type": "ERROR",
                            "message": err.to_string(),
                            "retryable": err.is_retryable(),
                        }),
                    );
                })
        };

        let ports = PagerPorts::new(
            viewport.clone(),
            viewport.clone(),
            collection.clone(),
            backend.clone(),
        );
        let start = Instant::now();
        let handle = Pager::spawn(config, ports, callbacks)?;

        let delay = Duration::from_millis(args.step_delay_ms + args.latency_ms);
        let mut steps = 0;
        for step in 0..args.max_steps {
            tokio::time::sleep(delay).await;
            let snapshot = handle.snapshot().await?;
            if !snapshot.enabled && !snapshot.in_flight {
                break;
            }
            if step == args.max_steps / 2 {
                if let Some(height) = args.resize_to {
                    viewport.resize(height);
                }
            }
            viewport.scroll_by(args.step);
            steps = step + 1;
        }

        tokio::time::sleep(delay).await;
        let snapshot = handle.snapshot().await?;
        handle.destroy().await?;

        self.output_message(&json!({
            "type": "SUMMARY",
            "steps": steps,
            "pages": snapshot.page,
            "collection_len": collection.len(),
            "requests": backend.request_count(),
            "max_in_flight": backend.max_in_flight(),
            "exhausted": !snapshot.enabled,
            "elapsed_ms": start.elapsed().as_millis() as u64,
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        emit(self.cli.format, msg);
    }
}

fn emit(format: OutputFormat, msg: &Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
        OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        }
    }
}
