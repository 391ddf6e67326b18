//! Orchestration of the three views: resolve, fetch, aggregate.

use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;

use crate::api::AccountId;
use crate::config::{AnalyticsSettings, ConfigError};
use crate::error::AnalyticsResult;
use crate::gateway::ConcurrencyGateway;
use crate::models::time::{TimestampFormatter, ViewKind, HOUR_MS};
use crate::models::ConcurrencySeries;
use crate::routes::detail::{DetailView, LinkedDetailRow};
use crate::routes::request::{PeakMarker, RequestView};
use crate::routes::summary::SummaryView;
use crate::services::detail::DetailAggregator;
use crate::services::drilldown::{DetailLink, DrillDownLinker, RequestLink};
use crate::services::heatmap::{HeatmapMatrixBuilder, DEFAULT_ROW_SPAN};
use crate::services::overview::OverviewCalculator;
use crate::services::requests::RequestProjector;
use crate::services::summary::SummaryAggregator;
use crate::services::time_range::{TimeRangeResolver, TimeRangeSelection};

/// Loads the summary, detail and request views of an account.
///
/// The concurrency and violation fetches of one view run concurrently and
/// are joined before aggregation; either failing fails the load.
#[derive(Clone)]
pub struct InsightsPipeline {
    gateway: Arc<dyn ConcurrencyGateway>,
    formatter: TimestampFormatter,
    resolver: TimeRangeResolver,
    summary: SummaryAggregator,
    heatmap: HeatmapMatrixBuilder,
    detail: DetailAggregator,
    projector: RequestProjector,
    linker: DrillDownLinker,
    row_span: usize,
}

impl InsightsPipeline {
    pub fn new(
        gateway: Arc<dyn ConcurrencyGateway>,
        settings: &AnalyticsSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let formatter = settings.formatter()?;
        let calculator = OverviewCalculator::new(settings.limit_band()?, settings.top_integrations);
        Ok(Self::build(gateway, formatter, calculator, settings.row_span))
    }

    /// UTC, default band, five top integrations, 24-hour rows.
    pub fn with_defaults(gateway: Arc<dyn ConcurrencyGateway>) -> Self {
        Self::build(
            gateway,
            TimestampFormatter::utc(),
            OverviewCalculator::default(),
            DEFAULT_ROW_SPAN,
        )
    }

    fn build(
        gateway: Arc<dyn ConcurrencyGateway>,
        formatter: TimestampFormatter,
        calculator: OverviewCalculator,
        row_span: usize,
    ) -> Self {
        Self {
            gateway,
            formatter,
            resolver: TimeRangeResolver::new(formatter),
            summary: SummaryAggregator::new(formatter, calculator),
            heatmap: HeatmapMatrixBuilder::new(formatter),
            detail: DetailAggregator::new(formatter, calculator),
            projector: RequestProjector::new(formatter),
            linker: DrillDownLinker::new(formatter),
            row_span,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn ConcurrencyGateway> {
        &self.gateway
    }

    pub fn formatter(&self) -> TimestampFormatter {
        self.formatter
    }

    pub async fn load_summary(
        &self,
        account: &AccountId,
        selection: &TimeRangeSelection,
    ) -> AnalyticsResult<SummaryView> {
        self.load_summary_at(account, selection, Utc::now()).await
    }

    /// Summary view with relative windows resolved against `now`.
    pub async fn load_summary_at(
        &self,
        account: &AccountId,
        selection: &TimeRangeSelection,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<SummaryView> {
        let range = self.resolver.resolve_at(selection, ViewKind::Summary, now)?;
        let width = range.bucket_width_ms.unwrap_or(HOUR_MS);

        let (concurrency, violations) = tokio::try_join!(
            self.gateway
                .fetch_concurrency(account, range.start_ms, range.end_ms),
            self.gateway
                .fetch_violations(account, range.violation_start_ms, range.end_ms),
        )?;

        let series =
            ConcurrencySeries::from_samples(concurrency.points, range.start_ms, range.end_ms, width);
        let aggregate =
            self.summary
                .aggregate(&series, &violations, concurrency.overview.concurrency_limit);
        let grid = self.heatmap.to_grid(&aggregate.matrix, self.row_span)?;

        info!(
            "Loaded summary for {}: {} rows over [{}, {})",
            account,
            grid.rows.len(),
            range.start_ms,
            range.end_ms
        );

        Ok(SummaryView {
            range,
            overview: aggregate.overview,
            grid,
        })
    }

    pub async fn load_detail(
        &self,
        account: &AccountId,
        link: &DetailLink,
    ) -> AnalyticsResult<DetailView> {
        link.validate()?;
        let range = self.resolver.resolve(&link.selection(), ViewKind::Detail)?;

        let (concurrency, violations) = tokio::try_join!(
            self.gateway
                .fetch_concurrency(account, range.start_ms, range.end_ms),
            self.gateway
                .fetch_violations(account, range.violation_start_ms, range.end_ms),
        )?;

        let data = self.detail.aggregate(
            &concurrency.points,
            range.start_ms,
            range.end_ms,
            &violations,
            concurrency.overview.concurrency_limit,
        );

        let rows = data
            .rows
            .into_iter()
            .map(|row| {
                let request_path = self.linker.to_request_link(&row)?.path();
                Ok(LinkedDetailRow { row, request_path })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;

        info!(
            "Loaded detail for {}: {} minutes from {}",
            account,
            rows.len(),
            self.formatter.display(range.start_ms)
        );

        Ok(DetailView {
            overview: data.overview,
            config: data.config,
            rows,
        })
    }

    pub async fn load_requests(
        &self,
        account: &AccountId,
        link: &RequestLink,
    ) -> AnalyticsResult<RequestView> {
        link.validate()?;
        let range = self.resolver.resolve(&link.selection(), ViewKind::Request)?;
        let records = self
            .gateway
            .fetch_requests(account, range.start_ms, range.end_ms)
            .await?;

        info!(
            "Loaded {} requests for {} over [{}, {})",
            records.len(),
            account,
            range.start_ms,
            range.end_ms
        );

        Ok(RequestView {
            start_ms: range.start_ms,
            end_ms: range.end_ms,
            peak: link.peak.map(|peak| PeakMarker {
                value: peak.value,
                time_ms: peak.time_ms,
                time: self.formatter.precise(peak.time_ms),
            }),
            rows: self.projector.project(&records),
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
