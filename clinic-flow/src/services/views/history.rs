//! Flow history and the front-desk tracker

use super::FlowViews;
use crate::db::{flows, history};
use crate::models::{FlowHistoryEntry, PatientFlow};
use clinic_common::{Error, Result};

impl FlowViews {
    /// Chronological history of an appointment's flow
    pub async fn get_flow_history(
        &self,
        tenant_id: &str,
        appointment_id: &str,
    ) -> Result<Vec<FlowHistoryEntry>> {
        let flow = {
            let mut conn = self.db.acquire().await?;
            flows::find_by_appointment(&mut conn, tenant_id, appointment_id).await?
        };
        let flow = flow.ok_or_else(|| {
            Error::NotFound(format!("Patient flow for appointment {}", appointment_id))
        })?;

        history::list_for_flow(&self.db, tenant_id, flow.id).await
    }

    /// Today's open flows ordered by check-in time
    pub async fn list_active_flows(
        &self,
        tenant_id: &str,
        location_id: Option<&str>,
    ) -> Result<Vec<PatientFlow>> {
        flows::list_active_flows(&self.db, tenant_id, &self.today(), location_id).await
    }
}
