//! Vessel listing fields and their display labels
//!
//! The CMS stores vessel specifications in ACF field groups. Select fields
//! arrive either as a bare string or as a `{value, label}` pair depending on
//! the field's return format; both are normalized into [`SelectOption`] while
//! deserializing so the filter engine only ever sees one shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::entity::{lenient_bool, lenient_ids, lenient_number, lenient_string};

/// Kind of vessel a listing describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VesselType {
    Towboat,
    Tugboat,
    Barge,
}

impl VesselType {
    pub const ALL: [VesselType; 3] = [VesselType::Towboat, VesselType::Tugboat, VesselType::Barge];

    pub fn as_str(self) -> &'static str {
        match self {
            VesselType::Towboat => "towboat",
            VesselType::Tugboat => "tugboat",
            VesselType::Barge => "barge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VesselType::Towboat => "Towboat/Pushboat",
            VesselType::Tugboat => "Tugboat",
            VesselType::Barge => "Barge",
        }
    }
}

impl fmt::Display for VesselType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VesselType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        VesselType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("Unknown vessel type: {}", value))
    }
}

/// A select field value with its optional CMS-provided label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectOption {
    #[serde(rename = "value")]
    pub raw_value: String,
    #[serde(rename = "label", skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
}

impl SelectOption {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            display_label: None,
        }
    }

    pub fn labeled(raw_value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            display_label: Some(label.into()),
        }
    }

    /// Normalize a raw JSON select value; empty values yield `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(SelectOption::new(s.clone())),
            Value::Object(map) => {
                let raw_value = map.get("value")?.as_str().filter(|v| !v.is_empty())?;
                let display_label = map
                    .get("label")
                    .and_then(Value::as_str)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string);
                Some(SelectOption {
                    raw_value: raw_value.to_string(),
                    display_label,
                })
            }
            _ => None,
        }
    }
}

pub(crate) fn select_option<'de, D>(deserializer: D) -> Result<Option<SelectOption>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(SelectOption::from_json))
}

fn vessel_type<'de, D>(deserializer: D) -> Result<Option<VesselType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(SelectOption::from_json)
        .and_then(|option| option.raw_value.parse().ok()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselDimensions {
    #[serde(default, deserialize_with = "lenient_number")]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub beam: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub depth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub draft: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub air_draft: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselCoreSpecs {
    #[serde(default, deserialize_with = "lenient_number")]
    pub year_built: Option<f64>,
    #[serde(default)]
    pub dimensions: VesselDimensions,
    #[serde(default, deserialize_with = "lenient_number")]
    pub deadweight_tons: Option<f64>,
    #[serde(default, deserialize_with = "select_option")]
    pub classification_society: Option<SelectOption>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub length_unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselPropulsionPowerSpecs {
    #[serde(default, deserialize_with = "lenient_string")]
    pub main_engines: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reduction_gears: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub horse_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_horse_power: Option<f64>,
    #[serde(default, deserialize_with = "select_option")]
    pub propulsion: Option<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselFuel {
    #[serde(default, rename = "type", deserialize_with = "select_option")]
    pub fuel_type: Option<SelectOption>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bunkering: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselCargoCapacity {
    #[serde(default, deserialize_with = "lenient_number")]
    pub barrels: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub m3_metric_tons: Option<String>,
}

/// Tank barge details; only filled in for barges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselBargeTankFields {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub regulated_us: bool,
    #[serde(default, deserialize_with = "object_or_default")]
    pub cargo_capacity: VesselCargoCapacity,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pumps: Option<String>,
    #[serde(default, deserialize_with = "select_option")]
    pub cargo_tank_material: Option<SelectOption>,
    #[serde(default, deserialize_with = "select_option")]
    pub vapor_recovery: Option<SelectOption>,
    #[serde(default, deserialize_with = "select_option")]
    pub heated: Option<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselBargeSpecs {
    #[serde(default, deserialize_with = "object_or_default")]
    pub tank_fields: VesselBargeTankFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselSpecs {
    #[serde(default)]
    pub core_specs: VesselCoreSpecs,
    #[serde(default)]
    pub propulsion_power_specs: VesselPropulsionPowerSpecs,
    #[serde(default, deserialize_with = "object_or_default")]
    pub barge_specs: VesselBargeSpecs,
    #[serde(default)]
    pub fuel: VesselFuel,
}

/// Nested ACF group that arrives as `null` or `false` until saved
fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value) if value.is_object() => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(T::default()),
    }
}

/// Display labels of a vessel's select fields; unset fields are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VesselLabels {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vessel_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub barge_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub condition: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub classification_society: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub propulsion: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fuel_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pumps: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cargo_tank_material: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vapor_recovery: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub heated: String,
}

/// The ACF field group of a vessel listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselAcf {
    #[serde(default, deserialize_with = "vessel_type")]
    pub vessel_type: Option<VesselType>,
    #[serde(default, deserialize_with = "select_option")]
    pub barge_type: Option<SelectOption>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "select_option")]
    pub condition: Option<SelectOption>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_asking_price: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub asking_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default)]
    pub specs: VesselSpecs,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub gallery: Vec<u64>,
}

impl VesselAcf {
    pub fn year_built(&self) -> Option<f64> {
        self.specs.core_specs.year_built
    }

    /// Total installed horsepower, falling back to the per-engine figure
    pub fn horsepower(&self) -> Option<f64> {
        let power = &self.specs.propulsion_power_specs;
        power.total_horse_power.or(power.horse_power)
    }

    /// Published asking price; unpublished or zero prices are absent
    pub fn asking_price(&self) -> Option<f64> {
        if !self.has_asking_price {
            return None;
        }
        self.asking_price.filter(|price| *price != 0.0)
    }

    pub fn length(&self) -> Option<f64> {
        self.specs.core_specs.dimensions.length
    }

    pub fn propulsion(&self) -> Option<&str> {
        raw(&self.specs.propulsion_power_specs.propulsion)
    }

    pub fn fuel_type(&self) -> Option<&str> {
        raw(&self.specs.fuel.fuel_type)
    }

    pub fn barge_type(&self) -> Option<&str> {
        raw(&self.barge_type)
    }

    /// Labels for the detail page; tank fields only for barges
    pub fn labels(&self) -> VesselLabels {
        let specs = &self.specs;
        let mut labels = VesselLabels {
            vessel_type: self.vessel_type.map(|t| t.label().to_string()).unwrap_or_default(),
            barge_type: select_label(self.barge_type.as_ref(), Some(&BARGE_TYPE_LABELS)),
            condition: select_label(self.condition.as_ref(), None),
            classification_society: select_label(
                specs.core_specs.classification_society.as_ref(),
                Some(&CLASSIFICATION_SOCIETY_LABELS),
            ),
            propulsion: select_label(
                specs.propulsion_power_specs.propulsion.as_ref(),
                Some(&PROPULSION_LABELS),
            ),
            fuel_type: select_label(specs.fuel.fuel_type.as_ref(), Some(&FUEL_TYPE_LABELS)),
            ..VesselLabels::default()
        };

        if self.vessel_type == Some(VesselType::Barge) {
            let tank = &specs.barge_specs.tank_fields;
            labels.pumps = tank
                .pumps
                .as_deref()
                .map(|pumps| PUMP_LABELS.label_or_value(pumps))
                .unwrap_or_default();
            labels.cargo_tank_material =
                select_label(tank.cargo_tank_material.as_ref(), Some(&CARGO_TANK_MATERIAL_LABELS));
            labels.vapor_recovery =
                select_label(tank.vapor_recovery.as_ref(), Some(&VAPOR_RECOVERY_LABELS));
            labels.heated = select_label(tank.heated.as_ref(), Some(&HEATING_LABELS));
        }
        labels
    }
}

fn raw(option: &Option<SelectOption>) -> Option<&str> {
    option.as_ref().map(|o| o.raw_value.as_str())
}

/// Immutable value -> display label table
#[derive(Debug, Clone, Copy)]
pub struct LabelTable(&'static [(&'static str, &'static str)]);

impl LabelTable {
    pub fn get(&self, value: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(key, _)| *key == value)
            .map(|(_, label)| *label)
    }

    /// Label for `value`, or `value` itself when unmapped
    pub fn label_or_value(&self, value: &str) -> String {
        self.get(value).unwrap_or(value).to_string()
    }
}

pub const BARGE_TYPE_LABELS: LabelTable = LabelTable(&[
    ("dry", "Dry Cargo / Hopper"),
    ("deck", "Deck"),
    ("tank", "Tank"),
]);

pub const CLASSIFICATION_SOCIETY_LABELS: LabelTable = LabelTable(&[
    ("abs", "ABS"),
    ("dnv", "DNV"),
    ("bv", "Bureau Veritas"),
    ("none", "Unclassified"),
]);

pub const PUMP_LABELS: LabelTable = LabelTable(&[("single", "Single Pump"), ("dual", "Dual Pumps")]);

pub const PROPULSION_LABELS: LabelTable = LabelTable(&[
    ("conventional_open_wheel", "Conventional (Open Wheel)"),
    ("conventional_kort_nozzle", "Conventional (Kort Nozzle)"),
    ("z_drive", "Z-Drive"),
    ("other", "Other"),
]);

pub const VAPOR_RECOVERY_LABELS: LabelTable = LabelTable(&[
    ("common: Individual PV", "Common / Individual PV"),
    ("individual_pv", "Individual PV"),
    ("none", "No"),
]);

pub const HEATING_LABELS: LabelTable = LabelTable(&[
    ("steam_coils", "Steam Coils"),
    ("thermal_fuild", "Thermal Fluid"),
    ("none", "No"),
]);

pub const CARGO_TANK_MATERIAL_LABELS: LabelTable = LabelTable(&[
    ("steel", "Steel"),
    ("stainless", "Stainless Steel"),
    ("lined", "Lined"),
]);

pub const FUEL_TYPE_LABELS: LabelTable = LabelTable(&[
    ("diesel_mgo", "Diesel (MGO)"),
    ("diesel_mdo", "Diesel (MDO)"),
    ("diesel_ulsfo", "Diesel (ULSFO/VLSFO)"),
    ("biodiesel_blend", "Biodiesel blend"),
    ("hvo_renewable_diesel", "HVO/Renewable Diesel"),
    ("lng_dual_fuel", "LNG (dual-fuel)"),
    ("methanol_dual_fuel", "Methanol (dual-fuel)"),
    ("lpg_dual_fuel", "LPG (dual-fuel)"),
    ("hydrogen_fuel_cell", "Hydrogen (fuel-cell)"),
    ("hybrid_diesel_electric", "Hybrid Diesel–Electric"),
    ("battery_electric", "Battery-Electric"),
]);

/// Display label for a select value
///
/// Prefers the label the CMS sent, then the static table, then the raw
/// value. An absent option renders as an empty string.
pub fn select_label(option: Option<&SelectOption>, table: Option<&LabelTable>) -> String {
    let Some(option) = option else {
        return String::new();
    };

    if let Some(label) = &option.display_label {
        return label.clone();
    }

    table
        .and_then(|t| t.get(&option.raw_value))
        .map(str::to_string)
        .unwrap_or_else(|| option.raw_value.clone())
}
