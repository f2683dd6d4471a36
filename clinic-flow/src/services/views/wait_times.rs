//! Wait-time statistics per location

use super::FlowViews;
use crate::db::flows::{self, WaitTimeRow};
use crate::models::WaitTimeStats;
use clinic_common::Result;
use tracing::debug;

/// Round an average to one decimal minute
pub fn round_minutes(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 10.0).round() / 10.0)
}

impl From<WaitTimeRow> for WaitTimeStats {
    fn from(row: WaitTimeRow) -> Self {
        Self {
            location_id: row.location_id,
            avg_checkin_to_rooming: round_minutes(row.checkin_to_rooming),
            avg_rooming_to_vitals: round_minutes(row.rooming_to_vitals),
            avg_vitals_to_provider: round_minutes(row.vitals_to_provider),
            avg_with_provider: round_minutes(row.with_provider),
            avg_total_visit: round_minutes(row.total_visit),
            waiting_count: row.waiting_count,
            with_provider_count: row.with_provider_count,
            completed_count: row.completed_count,
            total_flows: row.total_flows,
        }
    }
}

impl FlowViews {
    /// Today's averages and live counts, one entry per location with flows
    ///
    /// With a location filter the result always holds exactly that location.
    pub async fn get_wait_times(
        &self,
        tenant_id: &str,
        location_id: Option<&str>,
    ) -> Result<Vec<WaitTimeStats>> {
        let today = self.today();

        let mut stats: Vec<WaitTimeStats> =
            flows::wait_time_aggregates(&self.db, tenant_id, &today, location_id)
                .await?
                .into_iter()
                .map(WaitTimeStats::from)
                .collect();

        if let Some(location_id) = location_id {
            if stats.is_empty() {
                stats.push(WaitTimeStats::empty(location_id));
            }
        }

        debug!(tenant_id = %tenant_id, locations = stats.len(), "Computed wait times");
        Ok(stats)
    }
}
