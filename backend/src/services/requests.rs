//! Display shaping of request records.

use crate::models::time::TimestampFormatter;
use crate::models::RequestRecord;
use crate::routes::request::RequestDisplayRow;

/// Formats request records for the request view. Order and content are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestProjector {
    formatter: TimestampFormatter,
}

impl RequestProjector {
    pub fn new(formatter: TimestampFormatter) -> Self {
        Self { formatter }
    }

    pub fn project(&self, records: &[RequestRecord]) -> Vec<RequestDisplayRow> {
        records.iter().map(|record| self.project_one(record)).collect()
    }

    fn project_one(&self, record: &RequestRecord) -> RequestDisplayRow {
        RequestDisplayRow {
            start_time: self.formatter.display(record.start_time_ms),
            end_time: self.formatter.display(record.end_time_ms),
            script_type: record.script_type.clone(),
            integration: record.integration.clone(),
            operation: record.operation.clone(),
            script_name: record.script_name.clone(),
            status: record.status.clone(),
        }
    }
}
