//! Renders batches of monitoring alerts into Slack Block Kit payloads.
//!
//! An [`AlertBatch`] goes in, an ordered sequence of [`MessageBlock`]s comes
//! out: a header, deep-link fields into Grafana and the alerting UI, firing
//! and resolved host lists, an optional panel screenshot and a context line
//! with deduplicated summaries. Delivery of the finished payload is up to
//! the embedding notifier.
//!
//! ```no_run
//! use grafana_slack_blocks::{AlertBatch, GrafanaConfig, MessageAssembler};
//!
//! # async fn run(batch: AlertBatch) -> Result<(), Box<dyn std::error::Error>> {
//! let assembler = MessageAssembler::new(GrafanaConfig {
//!     grafana_url: "https://grafana.example.com".to_string(),
//!     grafana_tz: "UTC".to_string(),
//!     ..GrafanaConfig::default()
//! });
//! let blocks = assembler.assemble(&batch).await?;
//! let payload = serde_json::to_string(&blocks)?;
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod assembler;
pub mod blocks;
pub mod config;
pub mod dedup;
pub mod grafana;
pub mod html;
pub mod image;

pub use alerts::{Alert, AlertBatch, AlertStatus};
pub use assembler::{AssembleError, MessageAssembler};
pub use blocks::{Element, Field, MessageBlock, Text};
pub use config::{GrafanaConfig, Secret};
pub use grafana::{Clock, LinkError, SystemClock};
pub use image::{ImageError, ImageHost, ImageResolver, SlackImageHost, UploadedImage};
