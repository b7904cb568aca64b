//! Turns an alert batch into the ordered block sequence of one Slack
//! message.
//!
//! Assembly is a single pass with no state kept between invocations. Every
//! collaborator failure short of an empty batch degrades to a placeholder
//! field or an omitted block; the message itself always goes out.

use thiserror::Error;

use crate::alerts::{Alert, AlertBatch, AlertStatus};
use crate::blocks::{Element, Field, MessageBlock};
use crate::config::GrafanaConfig;
use crate::dedup::{self, DEFAULT_MERGE_THRESHOLD};
use crate::grafana::{self, Clock, SystemClock};
use crate::image::ImageResolver;

/// Maximum length of a merged summary line, in code points.
const SUMMARY_LIMIT: usize = 500;
const IMAGE_ALT_TEXT: &str = "inspiration";

#[derive(Debug, Error)]
pub enum AssembleError {
    /// The batch carried no alerts; there is nothing to render.
    #[error("alert batch contains no alerts")]
    EmptyBatch,
}

/// Display fields accumulated in one pass over the batch.
#[derive(Debug, Default)]
struct Aggregates {
    firing: Vec<String>,
    resolved: Vec<String>,
    severity: Vec<String>,
    envs: Vec<String>,
    dashboard_uid: String,
    panel_id: String,
    org_id: String,
    runbook_url: String,
}

type LabelHandler = fn(&mut Aggregates, AlertStatus, &str);
type AnnotationHandler = fn(&mut Aggregates, &str);

fn bucket_host(agg: &mut Aggregates, status: AlertStatus, value: &str) {
    match status {
        AlertStatus::Firing => agg.firing.push(value.to_string()),
        AlertStatus::Resolved => agg.resolved.push(value.to_string()),
    }
}

fn bucket_severity(agg: &mut Aggregates, _status: AlertStatus, value: &str) {
    agg.severity.push(value.to_string());
}

fn bucket_env(agg: &mut Aggregates, _status: AlertStatus, value: &str) {
    agg.envs.push(value.to_string());
}

fn note_dashboard(agg: &mut Aggregates, value: &str) {
    agg.dashboard_uid = value.to_string();
}

fn note_panel(agg: &mut Aggregates, value: &str) {
    agg.panel_id = value.to_string();
}

fn note_org(agg: &mut Aggregates, value: &str) {
    agg.org_id = value.to_string();
}

fn note_runbook(agg: &mut Aggregates, value: &str) {
    agg.runbook_url = value.to_string();
}

/// Recognized label names and their accumulators. Adding a field means
/// adding a row, not another branch.
const LABEL_HANDLERS: &[(&str, LabelHandler)] = &[
    ("host_name", bucket_host),
    ("severity", bucket_severity),
    ("env", bucket_env),
];

/// Recognized annotation names carrying routing hints. The last occurrence
/// across the batch wins.
const ANNOTATION_HANDLERS: &[(&str, AnnotationHandler)] = &[
    ("__dashboardUid__", note_dashboard),
    ("__panelId__", note_panel),
    ("orgid", note_org),
    ("runbook_url", note_runbook),
];

impl Aggregates {
    fn collect(alerts: &[Alert]) -> Self {
        let mut agg = Self::default();
        for alert in alerts {
            for (name, value) in &alert.labels {
                if let Some((_, handler)) =
                    LABEL_HANDLERS.iter().find(|(n, _)| *n == name.as_str())
                {
                    handler(&mut agg, alert.status, value);
                }
            }
            for (name, value) in &alert.annotations {
                if let Some((_, handler)) = ANNOTATION_HANDLERS
                    .iter()
                    .find(|(n, _)| *n == name.as_str())
                {
                    handler(&mut agg, value);
                }
            }
        }
        agg.severity = dedup::uniq(std::mem::take(&mut agg.severity));
        agg.resolved = dedup::uniq(std::mem::take(&mut agg.resolved));
        agg.firing = dedup::uniq(std::mem::take(&mut agg.firing));
        agg.envs = dedup::uniq(std::mem::take(&mut agg.envs));
        agg
    }
}

/// Builds Slack block payloads out of alert batches.
pub struct MessageAssembler {
    config: GrafanaConfig,
    resolver: Option<ImageResolver>,
    clock: Box<dyn Clock>,
}

impl MessageAssembler {
    /// Builds an assembler from the recognized options. The image pipeline
    /// is wired only when both credentials are configured.
    pub fn new(config: GrafanaConfig) -> Self {
        let resolver = if config.slack_token.is_empty() || config.grafana_token.is_empty() {
            None
        } else {
            match ImageResolver::from_config(&config) {
                Ok(resolver) => Some(resolver),
                Err(error) => {
                    tracing::warn!(%error, "image pipeline disabled");
                    None
                }
            }
        };
        Self {
            config,
            resolver,
            clock: Box::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ImageResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Renders a batch routed through Grafana alerting: deep links into the
    /// dashboard, an optional panel screenshot and a runbook-wrapped
    /// summary.
    pub async fn assemble(&self, batch: &AlertBatch) -> Result<Vec<MessageBlock>, AssembleError> {
        if batch.alerts.is_empty() {
            return Err(AssembleError::EmptyBatch);
        }
        let agg = Aggregates::collect(&batch.alerts);

        let mut blocks = Vec::new();
        blocks.push(MessageBlock::header(batch.common_label("alertname")));
        blocks.push(self.link_fields(batch, &agg));
        blocks.push(status_fields(&agg));

        if let Some(block) = self.image_block(&agg).await {
            blocks.push(block);
        }

        let mut elements = Vec::new();
        if let Some(description) = description_element(batch, true) {
            elements.push(description);
        }
        if let Some(summary) = summary_element(batch, &agg.runbook_url) {
            elements.push(summary);
        }
        if !elements.is_empty() {
            blocks.push(MessageBlock::context(elements));
        }

        Ok(blocks)
    }

    /// Renders a batch from a classic Alertmanager route: no dashboard
    /// hints, a Graph link from the alert itself and an optional Logs link.
    pub fn assemble_plain(&self, batch: &AlertBatch) -> Result<Vec<MessageBlock>, AssembleError> {
        if batch.alerts.is_empty() {
            return Err(AssembleError::EmptyBatch);
        }
        let agg = Aggregates::collect(&batch.alerts);

        let mut blocks = Vec::new();
        blocks.push(MessageBlock::header(batch.common_label("alertname")));
        blocks.push(MessageBlock::Divider);
        blocks.push(plain_link_fields(batch, &agg));
        blocks.push(status_fields(&agg));

        let mut elements = Vec::new();
        if let Some(summary) = summary_element(batch, "") {
            elements.push(summary);
        }
        if let Some(description) = description_element(batch, false) {
            elements.push(description);
        }
        if !elements.is_empty() {
            blocks.push(MessageBlock::context(elements));
        }

        Ok(blocks)
    }

    fn link_fields(&self, batch: &AlertBatch, agg: &Aggregates) -> MessageBlock {
        let mut fields = Vec::new();
        fields.push(Field::mrkdwn(format!(
            "*Env: {}*",
            agg.envs.join(", ").to_uppercase()
        )));
        fields.push(Field::mrkdwn(format!(
            "*Severety: {}*",
            agg.severity.join(", ").to_uppercase()
        )));

        match grafana::dashboard_panel_url(
            &self.config.grafana_url,
            &agg.org_id,
            &agg.dashboard_uid,
            &agg.panel_id,
        ) {
            Ok(url) => fields.push(Field::mrkdwn(format!(
                "*<{url}|:chart_with_upwards_trend:Panel>*"
            ))),
            Err(_) => fields.push(Field::mrkdwn(":chart_with_upwards_trend:~Panel~")),
        }

        match grafana::silence_url(&batch.external_url, &batch.common_labels) {
            Ok(url) => fields.push(Field::mrkdwn(format!("*<{url}|:no_bell:Silence>*"))),
            Err(_) => fields.push(Field::mrkdwn("*:no_bell:~Silence~")),
        }

        match grafana::dashboard_url(&self.config.grafana_url, &agg.org_id, &agg.dashboard_uid) {
            Ok(url) => fields.push(Field::mrkdwn(format!("*<{url}|:dashboard:Dash>*"))),
            Err(_) => fields.push(Field::mrkdwn(":dashboard:~Dash~")),
        }

        match batch.alerts.iter().find(|a| !a.generator_url.is_empty()) {
            Some(alert) => fields.push(Field::mrkdwn(format!(
                "*<{}|:gear:Edit>*",
                grafana::edit_url(&alert.generator_url, &agg.org_id)
            ))),
            None => fields.push(Field::mrkdwn("*:gear:~Edit~")),
        }

        MessageBlock::section(fields)
    }

    async fn image_block(&self, agg: &Aggregates) -> Option<MessageBlock> {
        let resolver = self.resolver.as_ref()?;
        let render_url = match grafana::render_url(
            &self.config.grafana_url,
            &self.config.grafana_tz,
            &agg.org_id,
            &agg.dashboard_uid,
            &agg.panel_id,
            self.clock.as_ref(),
        ) {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(%error, "render link construction failed, omitting image");
                return None;
            }
        };
        match resolver.resolve_image(&render_url).await {
            Ok(url) if !url.is_empty() => Some(MessageBlock::image(url, IMAGE_ALT_TEXT)),
            Ok(_) => {
                tracing::debug!("share page exposed no image, omitting image block");
                None
            }
            Err(error) => {
                tracing::warn!(%error, "image resolution failed, omitting image block");
                None
            }
        }
    }
}

fn plain_link_fields(batch: &AlertBatch, agg: &Aggregates) -> MessageBlock {
    let mut fields = Vec::new();
    fields.push(Field::mrkdwn(format!(
        "*Env: {}*",
        agg.envs.join(", ").to_uppercase()
    )));
    fields.push(Field::mrkdwn(format!(
        "*Severety: {}*",
        agg.severity.join(", ").to_uppercase()
    )));

    let mut graph_url = String::new();
    for alert in &batch.alerts {
        if let Some(link) = alert.annotations.get("graph_link") {
            graph_url = link.clone();
            break;
        }
        if !alert.generator_url.is_empty() {
            graph_url = alert.generator_url.clone();
            break;
        }
    }
    if graph_url.is_empty() {
        fields.push(Field::mrkdwn(":chart_with_upwards_trend:~Graph~"));
    } else {
        fields.push(Field::mrkdwn(format!(
            "*<{graph_url}|:chart_with_upwards_trend:Graph>*"
        )));
    }

    match grafana::silence_url(&batch.external_url, &batch.common_labels) {
        Ok(url) => fields.push(Field::mrkdwn(format!("*<{url}|:no_bell:Silence>*"))),
        Err(_) => fields.push(Field::mrkdwn("*:no_bell:~Silence~")),
    }

    let log_link = batch.common_annotation("log_link");
    if !log_link.is_empty() {
        fields.push(Field::mrkdwn(format!("*<{log_link}|:scroll:Logs>*")));
    }

    MessageBlock::section(fields)
}

fn status_fields(agg: &Aggregates) -> MessageBlock {
    let mut fields = Vec::new();
    if !agg.firing.is_empty() && !agg.resolved.is_empty() {
        fields.push(Field::mrkdwn(format!(
            "*Firing:* `{}`",
            agg.firing.join(", ")
        )));
        fields.push(Field::mrkdwn(format!(
            "*Resolved:* `{}`",
            agg.resolved.join(", ")
        )));
    } else if !agg.resolved.is_empty() {
        fields.push(Field::mrkdwn(format!(
            "*Resolved: *`{}`",
            agg.resolved.join(", ")
        )));
    } else {
        fields.push(Field::mrkdwn(format!(
            "*Firing: *`{}`",
            agg.firing.join(", ")
        )));
    }
    MessageBlock::section(fields)
}

fn description_element(batch: &AlertBatch, trailing_newlines: bool) -> Option<Element> {
    let common = batch.common_annotation("description");
    let value = if common.is_empty() {
        batch
            .alerts
            .iter()
            .map(|alert| alert.annotation("description"))
            .find(|text| !text.is_empty())
            .unwrap_or("")
    } else {
        common
    };
    if value.is_empty() {
        return None;
    }
    if trailing_newlines {
        Some(Element::mrkdwn(format!("*Description:* {value}\n\n")))
    } else {
        Some(Element::mrkdwn(format!("*Description:* {value}")))
    }
}

fn summary_element(batch: &AlertBatch, runbook_url: &str) -> Option<Element> {
    let common = batch.common_annotation("summary");
    let text = if common.is_empty() {
        let summaries: Vec<String> = batch
            .alerts
            .iter()
            .map(|alert| alert.annotation("summary"))
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();
        let merged = dedup::merge_similar(&summaries, DEFAULT_MERGE_THRESHOLD);
        if merged.is_empty() {
            return None;
        }
        dedup::truncate_chars(&merged.join(";\n"), SUMMARY_LIMIT)
    } else {
        common.to_string()
    };

    if runbook_url.is_empty() {
        Some(Element::mrkdwn(format!("*Summary:* {text}")))
    } else {
        Some(Element::mrkdwn(format!("*<{runbook_url}|Summary:>* {text}")))
    }
}
