//! Provider queue

use super::FlowViews;
use crate::db::flows::{self, QueueRow};
use crate::models::ProviderQueueEntry;
use clinic_common::time;
use clinic_common::Result;
use std::cmp::Ordering;
use tracing::debug;

/// Queue order: priority (urgent, add-on, normal), then ready-for-provider time,
/// then scheduled start for flows that never reached ready_for_provider
pub fn queue_order(a: &ProviderQueueEntry, b: &ProviderQueueEntry) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| match (a.ready_for_provider_at, b.ready_for_provider_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => match (a.scheduled_start, b.scheduled_start) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        })
}

impl FlowViews {
    /// Today's flows waiting for, or with, a provider
    pub async fn get_provider_queue(
        &self,
        tenant_id: &str,
        provider_id: &str,
    ) -> Result<Vec<ProviderQueueEntry>> {
        let now = self.clock.now();
        let today = self.service_day.date_key(now);

        let rows = flows::list_provider_queue(&self.db, tenant_id, provider_id, &today).await?;

        let mut queue: Vec<ProviderQueueEntry> = rows
            .into_iter()
            .map(|row| {
                let QueueRow {
                    flow,
                    room_name,
                    appointment_type,
                    scheduled_start,
                } = row;
                ProviderQueueEntry {
                    flow_id: flow.id,
                    appointment_id: flow.appointment_id,
                    patient_id: flow.patient_id,
                    status: flow.status,
                    priority: flow.priority,
                    room_id: flow.room_id,
                    room_name,
                    wait_minutes: time::elapsed_minutes(flow.status_changed_at, now),
                    appointment_type,
                    scheduled_start,
                    ready_for_provider_at: flow.reached.ready_for_provider_at,
                }
            })
            .collect();

        queue.sort_by(queue_order);

        debug!(
            tenant_id = %tenant_id,
            provider_id = %provider_id,
            queued = queue.len(),
            "Built provider queue"
        );

        Ok(queue)
    }
}
