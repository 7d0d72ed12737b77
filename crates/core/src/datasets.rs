use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A typed row of one datos.gov.co dataset.
///
/// Mandatory columns are non-`Option` fields, so a record missing any of
/// them fails deserialization and is dropped at the corpus boundary.
pub trait Dataset: DeserializeOwned {
    /// Socrata resource id, e.g. `p6dx-8zbt`.
    const RESOURCE: &'static str;

    /// Composite identity used for duplicate removal.
    fn dedup_key(&self) -> String;

    /// The text column semantic queries are ranked against.
    fn search_text(&self) -> &str;
}

const KEY_SEPARATOR: char = '\u{1f}';

/// SECOP II contracting process (one procurement procedure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    #[serde(rename = "id_del_proceso")]
    pub process_id: String,
    #[serde(rename = "entidad")]
    pub entity: String,
    #[serde(rename = "descripci_n_del_procedimiento")]
    pub description: String,
    #[serde(rename = "precio_base", default)]
    pub base_price: Option<String>,
    #[serde(rename = "fecha_de_publicacion_del", default)]
    pub published_at: Option<String>,
    #[serde(rename = "fase", default)]
    pub phase: Option<String>,
    #[serde(rename = "duracion", default)]
    pub duration: Option<String>,
    #[serde(rename = "unidad_de_duracion", default)]
    pub duration_unit: Option<String>,
    #[serde(rename = "modalidad_de_contratacion", default)]
    pub modality: Option<String>,
    #[serde(rename = "estado_del_procedimiento", default)]
    pub status: Option<String>,
    #[serde(rename = "referencia_del_proceso", default)]
    pub reference: Option<String>,
    #[serde(rename = "nit_entidad", default)]
    pub entity_nit: Option<String>,
    #[serde(rename = "ordenentidad", default)]
    pub entity_order: Option<String>,
    #[serde(rename = "adjudicado", default)]
    pub awarded: Option<String>,
    #[serde(rename = "fecha_adjudicacion", default)]
    pub awarded_at: Option<String>,
    #[serde(rename = "nombre_del_proveedor", default)]
    pub awarded_supplier: Option<String>,
    #[serde(rename = "urlproceso", default)]
    pub process_url: Option<ProcessUrl>,
}

/// The API nests the process link as `{"url": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessUrl {
    #[serde(default)]
    pub url: Option<String>,
}

impl ProcessRecord {
    /// Socrata serves numeric columns as strings.
    pub fn base_price_value(&self) -> Option<f64> {
        self.base_price.as_deref()?.parse().ok()
    }

    pub fn url(&self) -> Option<&str> {
        self.process_url.as_ref()?.url.as_deref()
    }

    pub fn is_awarded(&self) -> bool {
        self.awarded.as_deref() == Some("Si")
    }
}

impl Dataset for ProcessRecord {
    const RESOURCE: &'static str = "p6dx-8zbt";

    fn dedup_key(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.process_id, self.entity)
    }

    fn search_text(&self) -> &str {
        &self.description
    }
}

/// Annual-acquisition-plan header (one entity, one year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    #[serde(rename = "nombre_entidad")]
    pub entity_name: String,
    #[serde(rename = "anno", default)]
    pub year: Option<String>,
    #[serde(rename = "nit_entidad", default)]
    pub entity_nit: Option<String>,
    #[serde(rename = "valor_presupuesto_general", default)]
    pub general_budget: Option<String>,
}

impl PlanRecord {
    pub fn general_budget_value(&self) -> Option<f64> {
        self.general_budget.as_deref()?.parse().ok()
    }
}

impl Dataset for PlanRecord {
    const RESOURCE: &'static str = "b6m4-qgqv";

    fn dedup_key(&self) -> String {
        format!(
            "{}{KEY_SEPARATOR}{}",
            self.entity_name,
            self.year.as_deref().unwrap_or_default()
        )
    }

    fn search_text(&self) -> &str {
        &self.entity_name
    }
}

/// One bidder on one contracting process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRecord {
    #[serde(rename = "proveedor")]
    pub bidder: String,
    #[serde(rename = "id_procedimiento", default)]
    pub procedure_id: Option<String>,
    #[serde(rename = "fecha_publicaci_n", default)]
    pub published_at: Option<String>,
    #[serde(rename = "nit_del_proveedor", default)]
    pub bidder_nit: Option<String>,
    #[serde(rename = "entidad", default)]
    pub entity: Option<String>,
}

impl Dataset for SupplierRecord {
    const RESOURCE: &'static str = "hgi6-6wh3";

    fn dedup_key(&self) -> String {
        format!(
            "{}{KEY_SEPARATOR}{}",
            self.bidder,
            self.procedure_id.as_deref().unwrap_or_default()
        )
    }

    fn search_text(&self) -> &str {
        &self.bidder
    }
}

/// Registered state entity from the Función Pública universe.
///
/// The API serves lowercase column names; the aliases accept the uppercase
/// spellings used by the reference CSV export of the same registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "nombre", alias = "NOMBRE")]
    pub name: String,
    #[serde(rename = "ccb_nit_inst", alias = "CCB_NIT_INST", default)]
    pub nit: Option<String>,
    #[serde(rename = "orden", alias = "ORDEN", default)]
    pub order: Option<String>,
    #[serde(rename = "sector", alias = "SECTOR", default)]
    pub sector: Option<String>,
}

impl Dataset for EntityRecord {
    const RESOURCE: &'static str = "h7zv-k39x";

    fn dedup_key(&self) -> String {
        self.name.clone()
    }

    fn search_text(&self) -> &str {
        &self.name
    }
}
