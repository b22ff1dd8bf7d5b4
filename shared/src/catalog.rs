//! Medication catalog and per-site stock types
//!
//! Wire-compatible with the Medifast backend: field names follow the
//! server's JSON (a mix of camelCase and snake_case), mapped to Rust
//! naming via serde renames.

use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Entities
// ============================================================================

/// A medication in the catalog. Immutable from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: i64,
    /// Display name
    #[serde(rename = "nombreMedicamento")]
    pub name: String,
    /// Classification tag
    #[serde(rename = "tipo")]
    pub kind: String,
    /// Reference code
    #[serde(rename = "referencia")]
    pub reference: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// Embedded image payload (base64), if the server attached one
    #[serde(rename = "foto", default)]
    pub photo: Option<String>,
    #[serde(rename = "nombre_archivo", default)]
    pub photo_file_name: Option<String>,
    #[serde(rename = "tipo_mime", default)]
    pub photo_mime_type: Option<String>,
}

/// A physical pickup location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    #[serde(rename = "nombreSede")]
    pub name: String,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

// ============================================================================
// Stock
// ============================================================================

/// Server-computed stock label carried on availability rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Disponible,
    PocoStock,
    Agotado,
}

impl StockStatus {
    /// Wire string as emitted by the server
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Disponible => "disponible",
            StockStatus::PocoStock => "poco_stock",
            StockStatus::Agotado => "agotado",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Units at or below this count are classified as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Client-derived severity tier, re-derived from the numeric count.
///
/// Independent of [`StockStatus`]: the server label is display metadata,
/// while this tier drives badges and the non-blocking add-to-cart warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Available,
    Low,
    Depleted,
}

impl StockLevel {
    /// Classify a raw unit count.
    pub fn classify(stock: u32) -> Self {
        if stock == 0 {
            StockLevel::Depleted
        } else if stock <= LOW_STOCK_THRESHOLD {
            StockLevel::Low
        } else {
            StockLevel::Available
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, StockLevel::Low | StockLevel::Depleted)
    }
}

// ============================================================================
// Availability
// ============================================================================

/// One stock row per (medication, site) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub id: i64,
    #[serde(rename = "id_medicamento")]
    pub medication_id: i64,
    #[serde(rename = "id_sede")]
    pub site_id: i64,
    pub stock: u32,
    #[serde(rename = "estado")]
    pub status: StockStatus,
    /// Embedded medication, when the server expands the relation
    #[serde(rename = "medicamento", default)]
    pub medication: Option<Medication>,
    #[serde(rename = "sede", default)]
    pub site: Option<Site>,
}

impl Availability {
    /// Severity tier derived from the numeric count.
    pub fn level(&self) -> StockLevel {
        StockLevel::classify(self.stock)
    }
}
