//! Realtime event vocabulary
//!
//! The backend pushes named events over the session channel; these types
//! give each wire name a typed payload. Structural events (catalog or
//! stock mutations) invalidate the availability cache; the rest are
//! passive notifications.

use serde::{Deserialize, Serialize};

use crate::catalog::{Availability, Medication};

/// Deletion notices carry only the entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedId {
    pub id: i64,
}

/// Payload of `alerta_stock_bajo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockAlert {
    #[serde(rename = "disponibilidad_id")]
    pub availability_id: i64,
    /// Medication display name
    #[serde(rename = "medicamento")]
    pub medication: String,
    /// Site display name
    #[serde(rename = "sede")]
    pub site: String,
    #[serde(rename = "stock_actual")]
    pub current_stock: u32,
    /// `alta` | `media`
    #[serde(rename = "criticidad")]
    pub severity: String,
    /// Optional preformatted message
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
}

/// Payload of `medicamento_consumido`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionNotice {
    #[serde(rename = "disponibilidad_id")]
    pub availability_id: i64,
    #[serde(rename = "cantidad_consumida")]
    pub consumed: u32,
    #[serde(rename = "stock_restante")]
    pub remaining_stock: u32,
    #[serde(rename = "medicamento", default)]
    pub medication: Option<String>,
    #[serde(rename = "sede", default)]
    pub site: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
}

/// A pushed event the server names but this client does not subscribe to.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown server event: {name}")]
pub struct UnknownEvent {
    pub name: String,
}

/// A server-pushed domain event, one variant per subscribed wire name.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    MedicationCreated(Medication),
    MedicationUpdated(Medication),
    MedicationDeleted(DeletedId),
    AvailabilityCreated(Availability),
    AvailabilityUpdated(Availability),
    AvailabilityDeleted(DeletedId),
    /// Generic stock adjustment; payload shape is server-defined
    StockAdjusted(serde_json::Value),
    MedicationConsumed(ConsumptionNotice),
    LowStock(LowStockAlert),
    FavoriteAdded(serde_json::Value),
    FavoriteRemoved(serde_json::Value),
    UserUpdated(serde_json::Value),
    /// Channel-level error notice; logged and otherwise ignored
    Error(serde_json::Value),
}

impl ServerEvent {
    /// Decode a named event and its JSON payload.
    ///
    /// # Errors
    ///
    /// [`UnknownEvent`] for names outside the subscription list; payload
    /// decode failures for subscribed names are mapped to the same error
    /// so the read loop can log and drop the frame.
    pub fn parse(name: &str, payload: serde_json::Value) -> Result<Self, UnknownEvent> {
        let unknown = || UnknownEvent {
            name: name.to_string(),
        };

        let event = match name {
            "medicamento_creado" => {
                ServerEvent::MedicationCreated(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "medicamento_actualizado" => {
                ServerEvent::MedicationUpdated(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "medicamento_eliminado" => {
                ServerEvent::MedicationDeleted(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "disponibilidad_creada" => {
                ServerEvent::AvailabilityCreated(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "disponibilidad_actualizada" => {
                ServerEvent::AvailabilityUpdated(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "disponibilidad_eliminada" => {
                ServerEvent::AvailabilityDeleted(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "stock_ajustado" => ServerEvent::StockAdjusted(payload),
            "medicamento_consumido" => {
                ServerEvent::MedicationConsumed(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "alerta_stock_bajo" => {
                ServerEvent::LowStock(serde_json::from_value(payload).map_err(|_| unknown())?)
            }
            "favorito_agregado" => ServerEvent::FavoriteAdded(payload),
            "favorito_eliminado" => ServerEvent::FavoriteRemoved(payload),
            "usuario_actualizado" => ServerEvent::UserUpdated(payload),
            "error" => ServerEvent::Error(payload),
            _ => return Err(unknown()),
        };

        Ok(event)
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::MedicationCreated(_) => "medicamento_creado",
            ServerEvent::MedicationUpdated(_) => "medicamento_actualizado",
            ServerEvent::MedicationDeleted(_) => "medicamento_eliminado",
            ServerEvent::AvailabilityCreated(_) => "disponibilidad_creada",
            ServerEvent::AvailabilityUpdated(_) => "disponibilidad_actualizada",
            ServerEvent::AvailabilityDeleted(_) => "disponibilidad_eliminada",
            ServerEvent::StockAdjusted(_) => "stock_ajustado",
            ServerEvent::MedicationConsumed(_) => "medicamento_consumido",
            ServerEvent::LowStock(_) => "alerta_stock_bajo",
            ServerEvent::FavoriteAdded(_) => "favorito_agregado",
            ServerEvent::FavoriteRemoved(_) => "favorito_eliminado",
            ServerEvent::UserUpdated(_) => "usuario_actualizado",
            ServerEvent::Error(_) => "error",
        }
    }

    /// True for events that invalidate the availability cache.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ServerEvent::MedicationCreated(_)
                | ServerEvent::MedicationUpdated(_)
                | ServerEvent::MedicationDeleted(_)
                | ServerEvent::AvailabilityCreated(_)
                | ServerEvent::AvailabilityUpdated(_)
                | ServerEvent::AvailabilityDeleted(_)
                | ServerEvent::StockAdjusted(_)
                | ServerEvent::MedicationConsumed(_)
        )
    }
}
