//! Row/column projection of the summary matrix for grid renderers.

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::time::TimestampFormatter;
use crate::routes::summary::{ColumnDef, GridCell, HeatCell, HeatmapGrid, RowRecord};
use crate::services::drilldown::DrillDownLinker;

/// Cells per row for hourly data: one row per calendar day.
pub const DEFAULT_ROW_SPAN: usize = 24;

/// Split time-ordered cells into rows of `row_span`.
///
/// Every row is full except possibly the last, which holds the remainder.
pub fn chunk_rows<T>(cells: &[T], row_span: usize) -> AnalyticsResult<Vec<&[T]>> {
    if row_span == 0 {
        return Err(AnalyticsError::InvalidGridSpan(row_span));
    }
    Ok(cells.chunks(row_span).collect())
}

/// Builds a [`HeatmapGrid`] from heat cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatmapMatrixBuilder {
    formatter: TimestampFormatter,
    linker: DrillDownLinker,
}

impl HeatmapMatrixBuilder {
    pub fn new(formatter: TimestampFormatter) -> Self {
        Self {
            formatter,
            linker: DrillDownLinker::new(formatter),
        }
    }

    /// Columns are labelled by the local hour of the first row's cells.
    /// Each row is dated by its first cell.
    pub fn to_grid(&self, cells: &[HeatCell], row_span: usize) -> AnalyticsResult<HeatmapGrid> {
        let chunks = chunk_rows(cells, row_span)?;

        let columns = chunks
            .first()
            .map(|first| {
                first
                    .iter()
                    .enumerate()
                    .map(|(position, cell)| ColumnDef {
                        key: column_key(position),
                        position,
                        label: self.formatter.hour_label(cell.start_timestamp_ms),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let Some(first) = chunk.first() else {
                continue;
            };
            rows.push(RowRecord {
                date: self.formatter.date_label(first.start_timestamp_ms),
                start_timestamp_ms: first.start_timestamp_ms,
                values: chunk
                    .iter()
                    .map(|cell| self.grid_cell(cell))
                    .collect::<AnalyticsResult<Vec<_>>>()?,
            });
        }

        Ok(HeatmapGrid { columns, rows })
    }

    fn grid_cell(&self, cell: &HeatCell) -> AnalyticsResult<GridCell> {
        Ok(GridCell {
            value: cell.value,
            violated: cell.violated,
            start_timestamp_ms: cell.start_timestamp_ms,
            detail_path: self.linker.to_detail_link(cell)?.path(),
        })
    }
}

/// Key of the column at `position`, e.g. `"h5"`.
pub fn column_key(position: usize) -> String {
    format!("h{}", position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::{DAY_MS, HOUR_MS};
    use proptest::prelude::*;

    const E: i64 = 1_709_251_200_000;

    fn cells(count: usize) -> Vec<HeatCell> {
        (0..count)
            .map(|i| {
                let ts = E + i as i64 * HOUR_MS;
                HeatCell {
                    day_index: ((ts - E) / DAY_MS) as usize,
                    hour_index: (i % 24) as u32,
                    value: i as f64,
                    start_timestamp_ms: ts,
                    violated: i == 25,
                }
            })
            .collect()
    }

    #[test]
    fn test_zero_span_rejected() {
        assert!(matches!(
            chunk_rows(&[1, 2, 3], 0),
            Err(AnalyticsError::InvalidGridSpan(0))
        ));
    }

    #[test]
    fn test_empty_grid() {
        let grid = HeatmapMatrixBuilder::default().to_grid(&[], DEFAULT_ROW_SPAN).unwrap();
        assert!(grid.columns.is_empty());
        assert!(grid.rows.is_empty());
    }

    #[test]
    fn test_columns_and_dates() {
        let grid = HeatmapMatrixBuilder::default()
            .to_grid(&cells(48), DEFAULT_ROW_SPAN)
            .unwrap();

        assert_eq!(grid.columns.len(), 24);
        assert_eq!(grid.columns[0].label, "12 AM");
        assert_eq!(grid.columns[5].label, "5 AM");
        assert_eq!(grid.columns[13].label, "1 PM");
        assert_eq!(grid.columns[5].key, "h5");

        assert_eq!(grid.rows[0].date, "2024-03-01");
        assert_eq!(grid.rows[1].date, "2024-03-02");
        assert_eq!(grid.rows[1].start_timestamp_ms, E + DAY_MS);
    }

    #[test]
    fn test_violated_cell_is_distinct() {
        let grid = HeatmapMatrixBuilder::default()
            .to_grid(&cells(48), DEFAULT_ROW_SPAN)
            .unwrap();
        let flagged = &grid.rows[1].values[1];
        assert!(flagged.violated);
        assert_eq!(flagged.value, 25.0);
        assert_eq!(flagged.signed_value(), -25.0);
        assert!(!grid.rows[1].values[2].violated);
    }

    #[test]
    fn test_cells_carry_detail_paths() {
        let grid = HeatmapMatrixBuilder::default()
            .to_grid(&cells(24), DEFAULT_ROW_SPAN)
            .unwrap();
        assert_eq!(
            grid.rows[0].values[5].detail_path,
            format!("/concurrencyDetail/{}/{}", E + 5 * HOUR_MS, E + 6 * HOUR_MS)
        );
    }

    proptest! {
        #[test]
        fn prop_row_wrap(k in 0usize..6, r in 0usize..24) {
            let grid = HeatmapMatrixBuilder::default()
                .to_grid(&cells(24 * k + r), DEFAULT_ROW_SPAN)
                .unwrap();
            let full = grid.rows.iter().filter(|row| row.values.len() == 24).count();
            prop_assert_eq!(full, k);
            if r == 0 {
                prop_assert_eq!(grid.rows.len(), k);
            } else {
                prop_assert_eq!(grid.rows.len(), k + 1);
                prop_assert_eq!(grid.rows[k].values.len(), r);
            }
        }
    }
}
