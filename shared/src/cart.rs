//! Cart and pickup wire structures
//!
//! [`CartLine`] is the persisted device-local format (the `carrito` key);
//! [`PickupRequest`] is the batch-create entry derived from it at
//! submission time. Field names must match the backend and stored JSON
//! exactly, hence the renames.

use serde::{Deserialize, Serialize};

// ============================================================================
// Cart Line
// ============================================================================

/// One pending pickup selection: medication × site × quantity × slot.
///
/// Display names and the stock figure are snapshots taken at add time;
/// `max_quantity` bounds later quantity edits. Schedule fields start
/// empty (`""`) and are filled uniformly before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "medicamentoId")]
    pub medication_id: i64,
    #[serde(rename = "medicamentoNombre")]
    pub medication_name: String,
    #[serde(rename = "sedeId")]
    pub site_id: i64,
    #[serde(rename = "sedeNombre")]
    pub site_name: String,
    /// Stock observed at add time
    pub stock: u32,
    /// Server stock label observed at add time
    #[serde(rename = "estado")]
    pub status: String,
    /// `"" | YYYY-MM-DD`
    #[serde(rename = "fechaRecoleccion")]
    pub pickup_date: String,
    /// `"" | HH:MM:SS`
    #[serde(rename = "horaRecoleccion")]
    pub pickup_time: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    /// Upper bound for quantity edits, snapshot of stock at add time
    #[serde(rename = "maxCantidad")]
    pub max_quantity: u32,
}

impl CartLine {
    /// Both schedule fields filled.
    pub fn is_scheduled(&self) -> bool {
        !self.pickup_date.is_empty() && !self.pickup_time.is_empty()
    }
}

// ============================================================================
// Pickup Batch
// ============================================================================

/// One entry of a batch-create call (`POST /recolecciones/batch`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRequest {
    #[serde(rename = "id_medicamento")]
    pub medication_id: i64,
    #[serde(rename = "id_usuario")]
    pub user_id: i64,
    #[serde(rename = "id_sede")]
    pub site_id: i64,
    #[serde(rename = "fechaRecoleccion")]
    pub pickup_date: String,
    #[serde(rename = "horaRecoleccion")]
    pub pickup_time: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

/// Server-persisted pickup row. Read-only to this client; consumed by
/// history views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRecord {
    pub id: i64,
    #[serde(rename = "id_medicamento")]
    pub medication_id: i64,
    #[serde(rename = "id_usuario")]
    pub user_id: i64,
    /// Batch number shared by every record of one submission
    #[serde(rename = "NoRecoleccion")]
    pub batch_number: String,
    #[serde(rename = "fechaRecoleccion")]
    pub pickup_date: String,
    #[serde(rename = "horaRecoleccion")]
    pub pickup_time: String,
    #[serde(rename = "horaVencimiento", default)]
    pub expires_at: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    /// Fulfillment status code (0 = scheduled)
    #[serde(rename = "cumplimiento", default)]
    pub fulfillment: i32,
    #[serde(rename = "medicamento", default)]
    pub medication: Option<serde_json::Value>,
    #[serde(rename = "usuario", default)]
    pub user: Option<serde_json::Value>,
}
