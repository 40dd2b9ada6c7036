//! Vessel catalog facets and filtering
//!
//! [`build_metadata`] scans the unfiltered catalog for the outer bounds of
//! each numeric facet and the distinct values of each select facet.
//! [`VesselFilterValues`] is the typed filter criteria; it is built from
//! query parameters, clamped to the facet bounds, and evaluated per vessel
//! with [`VesselFilterValues::matches`].

use serde::Serialize;
use std::collections::HashSet;

use crate::entity::Vessel;
use crate::vessel::{
    BARGE_TYPE_LABELS, FUEL_TYPE_LABELS, LabelTable, PROPULSION_LABELS, VesselType,
};

/// Inclusive `[min, max]` of a numeric facet
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeBounds {
    pub min: f64,
    pub max: f64,
}

impl RangeBounds {
    fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|value| !value.is_nan())
            .fold(None, |bounds: Option<RangeBounds>, value| {
                Some(match bounds {
                    None => RangeBounds {
                        min: value,
                        max: value,
                    },
                    Some(b) => RangeBounds {
                        min: b.min.min(value),
                        max: b.max.max(value),
                    },
                })
            })
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Bounds of every numeric facet; `None` when no vessel has the attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VesselFilterRanges {
    pub year_built: Option<RangeBounds>,
    pub horsepower: Option<RangeBounds>,
    pub price: Option<RangeBounds>,
    pub length: Option<RangeBounds>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Everything the filter UI needs to render its controls
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VesselFilterMetadata {
    pub ranges: VesselFilterRanges,
    pub fuel_types: Vec<FilterOption>,
    pub barge_types: Vec<FilterOption>,
    pub propulsion_types: Vec<FilterOption>,
}

/// Compute facet bounds and options from the full, unfiltered catalog
///
/// Options appear in first-seen order.
pub fn build_metadata(vessels: &[Vessel]) -> VesselFilterMetadata {
    let ranges = VesselFilterRanges {
        year_built: RangeBounds::from_values(vessels.iter().map(|v| v.acf.year_built())),
        horsepower: RangeBounds::from_values(vessels.iter().map(|v| v.acf.horsepower())),
        price: RangeBounds::from_values(vessels.iter().map(|v| v.acf.asking_price())),
        length: RangeBounds::from_values(vessels.iter().map(|v| v.acf.length())),
    };

    VesselFilterMetadata {
        ranges,
        fuel_types: distinct_options(vessels.iter().map(|v| v.acf.fuel_type()), &FUEL_TYPE_LABELS),
        barge_types: distinct_options(
            vessels.iter().map(|v| v.acf.barge_type()),
            &BARGE_TYPE_LABELS,
        ),
        propulsion_types: distinct_options(
            vessels.iter().map(|v| v.acf.propulsion()),
            &PROPULSION_LABELS,
        ),
    }
}

fn distinct_options<'a, I>(values: I, labels: &LabelTable) -> Vec<FilterOption>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty() && seen.insert(*value))
        .map(|value| FilterOption {
            value: value.to_string(),
            label: labels.label_or_value(value),
        })
        .collect()
}

/// Filter criteria for the vessel listing; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VesselFilterValues {
    pub vessel_type: Option<VesselType>,
    /// Only enforced against barges
    pub barge_type: Option<String>,
    pub min_year: Option<f64>,
    pub max_year: Option<f64>,
    pub min_hp: Option<f64>,
    pub max_hp: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
    pub propulsion: Option<String>,
    pub fuel_type: Option<String>,
    /// Require a published asking price
    pub has_price: bool,
    /// Legacy CMS category id
    pub category: Option<u64>,
    /// Free-text term matched against title, slug and body
    pub search: Option<String>,
}

impl VesselFilterValues {
    /// Build criteria from query-string pairs
    ///
    /// Unknown keys, empty values, unparseable numbers and unknown vessel
    /// types are ignored. Later pairs win over earlier ones.
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = VesselFilterValues::default();

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                "type" => values.vessel_type = value.parse().ok(),
                "barge" => values.barge_type = Some(value.to_string()),
                "propulsion" => values.propulsion = Some(value.to_string()),
                "fuel" => values.fuel_type = Some(value.to_string()),
                "has_price" => {
                    values.has_price = matches!(value, "1" | "true" | "yes" | "on");
                }
                "min_year" => values.min_year = parse_number(value),
                "max_year" => values.max_year = parse_number(value),
                "min_hp" => values.min_hp = parse_number(value),
                "max_hp" => values.max_hp = parse_number(value),
                "min_price" => values.min_price = parse_number(value),
                "max_price" => values.max_price = parse_number(value),
                "min_length" => values.min_length = parse_number(value),
                "max_length" => values.max_length = parse_number(value),
                "category" => values.category = value.parse().ok().filter(|id| *id != 0),
                "search" => values.search = Some(value.to_string()),
                _ => {}
            }
        }

        values
    }

    /// Whether no criterion is set
    pub fn is_empty(&self) -> bool {
        *self == VesselFilterValues::default()
    }

    /// Clamp every fully specified min/max pair into the facet bounds
    pub fn clamp_to(mut self, ranges: &VesselFilterRanges) -> Self {
        clamp_pair(&mut self.min_year, &mut self.max_year, ranges.year_built);
        clamp_pair(&mut self.min_hp, &mut self.max_hp, ranges.horsepower);
        clamp_pair(&mut self.min_price, &mut self.max_price, ranges.price);
        clamp_pair(&mut self.min_length, &mut self.max_length, ranges.length);
        self
    }

    /// Whether `vessel` satisfies every criterion that is set
    pub fn matches(&self, vessel: &Vessel) -> bool {
        let acf = &vessel.acf;

        if let Some(kind) = self.vessel_type
            && acf.vessel_type != Some(kind)
        {
            return false;
        }

        if let Some(barge_type) = &self.barge_type
            && acf.vessel_type == Some(VesselType::Barge)
            && acf.barge_type() != Some(barge_type.as_str())
        {
            return false;
        }

        if !within(acf.year_built(), self.min_year, self.max_year)
            || !within(acf.horsepower(), self.min_hp, self.max_hp)
            || !within(acf.asking_price(), self.min_price, self.max_price)
        {
            return false;
        }

        if self.has_price && acf.asking_price().is_none() {
            return false;
        }

        if !within(acf.length(), self.min_length, self.max_length) {
            return false;
        }

        if let Some(propulsion) = &self.propulsion
            && acf.propulsion() != Some(propulsion.as_str())
        {
            return false;
        }

        if let Some(fuel_type) = &self.fuel_type
            && acf.fuel_type() != Some(fuel_type.as_str())
        {
            return false;
        }

        if let Some(category) = self.category
            && !vessel.categories.contains(&category)
        {
            return false;
        }

        if let Some(term) = &self.search
            && !matches_search(vessel, term)
        {
            return false;
        }

        true
    }
}

/// Clamp both ends of `[lo, hi]` into `bounds`; no bounds leaves it unchanged
pub fn clamp_range_to_bounds(value: (f64, f64), bounds: Option<RangeBounds>) -> (f64, f64) {
    match bounds {
        Some(bounds) => (bounds.clamp(value.0), bounds.clamp(value.1)),
        None => value,
    }
}

/// Vessels matching `criteria`, in catalog order
pub fn filter_vessels<'a>(vessels: &'a [Vessel], criteria: &VesselFilterValues) -> Vec<&'a Vessel> {
    vessels
        .iter()
        .filter(|vessel| criteria.matches(vessel))
        .collect()
}

fn clamp_pair(min: &mut Option<f64>, max: &mut Option<f64>, bounds: Option<RangeBounds>) {
    if let (Some(lo), Some(hi)) = (*min, *max) {
        let (lo, hi) = clamp_range_to_bounds((lo, hi), bounds);
        *min = Some(lo);
        *max = Some(hi);
    }
}

/// An absent attribute fails any bound that was requested
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

/// Case-insensitive substring match over the rendered title, slug and content
fn matches_search(vessel: &Vessel, term: &str) -> bool {
    let term = term.to_lowercase();
    [
        vessel.title.rendered.as_str(),
        vessel.slug.as_str(),
        vessel.content.rendered.as_str(),
    ]
    .into_iter()
    .any(|field| field.to_lowercase().contains(&term))
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn vessel(id: u64, acf: Value) -> Vessel {
        serde_json::from_value(json!({ "id": id, "slug": format!("vessel-{}", id), "acf": acf }))
            .unwrap()
    }

    fn with_hp(id: u64, hp: Option<f64>) -> Vessel {
        match hp {
            Some(hp) => vessel(
                id,
                json!({ "specs": { "propulsion_power_specs": { "total_horse_power": hp } } }),
            ),
            None => vessel(id, json!({})),
        }
    }

    #[test]
    fn test_horsepower_range_skips_missing() {
        let catalog = vec![
            with_hp(1, Some(1200.0)),
            with_hp(2, None),
            with_hp(3, Some(3000.0)),
        ];
        let metadata = build_metadata(&catalog);
        assert_eq!(
            metadata.ranges.horsepower,
            Some(RangeBounds {
                min: 1200.0,
                max: 3000.0
            })
        );
        assert_eq!(metadata.ranges.year_built, None);
    }

    #[test]
    fn test_horsepower_prefers_total() {
        let catalog = vec![vessel(
            1,
            json!({ "specs": { "propulsion_power_specs": { "horse_power": 800, "total_horse_power": 1600 } } }),
        )];
        let ranges = build_metadata(&catalog).ranges;
        assert_eq!(ranges.horsepower.map(|r| r.min), Some(1600.0));
    }

    #[test]
    fn test_price_range_requires_flag() {
        let catalog = vec![
            vessel(1, json!({ "has_asking_price": true, "asking_price": 500000 })),
            vessel(2, json!({ "has_asking_price": false, "asking_price": 10 })),
            vessel(3, json!({ "has_asking_price": true, "asking_price": 750000 })),
        ];
        let ranges = build_metadata(&catalog).ranges;
        assert_eq!(
            ranges.price,
            Some(RangeBounds {
                min: 500000.0,
                max: 750000.0
            })
        );
    }

    #[test]
    fn test_empty_catalog_has_no_ranges() {
        let metadata = build_metadata(&[]);
        assert_eq!(metadata, VesselFilterMetadata::default());
    }

    #[test]
    fn test_options_are_distinct_and_labeled() {
        let catalog = vec![
            vessel(1, json!({ "barge_type": "tank", "specs": { "fuel": { "type": "diesel_mgo" } } })),
            vessel(2, json!({ "barge_type": { "value": "tank", "label": "Tank" } })),
            vessel(3, json!({ "barge_type": "custom_hull" })),
            vessel(4, json!({ "specs": { "propulsion_power_specs": { "propulsion": "z_drive" } } })),
        ];
        let metadata = build_metadata(&catalog);

        let barge_values: Vec<&str> = metadata
            .barge_types
            .iter()
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(barge_values, vec!["tank", "custom_hull"]);
        assert_eq!(metadata.barge_types[0].label, BARGE_TYPE_LABELS.label_or_value("tank"));
        // Unmapped values fall back to the raw value
        assert_eq!(metadata.barge_types[1].label, "custom_hull");

        assert_eq!(metadata.fuel_types.len(), 1);
        assert_eq!(metadata.propulsion_types.len(), 1);
        assert_eq!(metadata.propulsion_types[0].value, "z_drive");
    }

    #[test]
    fn test_barge_subtype_mismatch() {
        let barge = vessel(1, json!({ "vessel_type": "barge", "barge_type": "tank" }));
        let criteria = VesselFilterValues {
            vessel_type: Some(VesselType::Barge),
            barge_type: Some("dry".to_string()),
            ..Default::default()
        };
        assert!(!criteria.matches(&barge));
    }

    #[test]
    fn test_barge_subtype_ignored_for_non_barges() {
        let tug = vessel(1, json!({ "vessel_type": "tugboat" }));
        let criteria = VesselFilterValues {
            barge_type: Some("dry".to_string()),
            ..Default::default()
        };
        assert!(criteria.matches(&tug));
    }

    #[test]
    fn test_vessel_type_mismatch() {
        let tug = vessel(1, json!({ "vessel_type": "tugboat" }));
        let untyped = vessel(2, json!({}));
        let criteria = VesselFilterValues {
            vessel_type: Some(VesselType::Towboat),
            ..Default::default()
        };
        assert!(!criteria.matches(&tug));
        assert!(!criteria.matches(&untyped));
    }

    #[test]
    fn test_missing_attribute_fails_requested_bound() {
        let no_year = vessel(1, json!({}));
        let criteria = VesselFilterValues {
            min_year: Some(1990.0),
            ..Default::default()
        };
        assert!(!criteria.matches(&no_year));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let v = vessel(1, json!({ "specs": { "core_specs": { "year_built": 2000, "dimensions": { "length": 150 } } } }));
        let criteria = VesselFilterValues {
            min_year: Some(2000.0),
            max_year: Some(2000.0),
            min_length: Some(100.0),
            max_length: Some(150.0),
            ..Default::default()
        };
        assert!(criteria.matches(&v));
    }

    #[test]
    fn test_has_price_flag() {
        let priced = vessel(1, json!({ "has_asking_price": true, "asking_price": 1000 }));
        let hidden = vessel(2, json!({ "has_asking_price": false, "asking_price": 1000 }));
        let zero = vessel(3, json!({ "has_asking_price": true, "asking_price": 0 }));
        let criteria = VesselFilterValues {
            has_price: true,
            ..Default::default()
        };
        assert!(criteria.matches(&priced));
        assert!(!criteria.matches(&hidden));
        assert!(!criteria.matches(&zero));
    }

    #[test]
    fn test_select_and_category_criteria() {
        let v: Vessel = serde_json::from_value(json!({
            "id": 1,
            "slug": "tow-1",
            "categories": [4, 9],
            "acf": {
                "specs": {
                    "propulsion_power_specs": { "propulsion": { "value": "z_drive", "label": "Z-Drive" } },
                    "fuel": { "type": "diesel_mgo" }
                }
            }
        }))
        .unwrap();

        let matching = VesselFilterValues {
            propulsion: Some("z_drive".to_string()),
            fuel_type: Some("diesel_mgo".to_string()),
            category: Some(9),
            ..Default::default()
        };
        assert!(matching.matches(&v));

        let wrong_category = VesselFilterValues {
            category: Some(5),
            ..Default::default()
        };
        assert!(!wrong_category.matches(&v));

        let wrong_fuel = VesselFilterValues {
            fuel_type: Some("lng".to_string()),
            ..Default::default()
        };
        assert!(!wrong_fuel.matches(&v));
    }

    #[test]
    fn test_from_query() {
        let criteria = VesselFilterValues::from_query([
            ("type", "barge"),
            ("barge", "tank"),
            ("min_year", "1990"),
            ("max_year", "abc"),
            ("min_hp", ""),
            ("has_price", "on"),
            ("category", "12"),
            ("unknown", "x"),
        ]);
        assert_eq!(criteria.vessel_type, Some(VesselType::Barge));
        assert_eq!(criteria.barge_type.as_deref(), Some("tank"));
        assert_eq!(criteria.min_year, Some(1990.0));
        assert_eq!(criteria.max_year, None);
        assert_eq!(criteria.min_hp, None);
        assert!(criteria.has_price);
        assert_eq!(criteria.category, Some(12));
    }

    #[test]
    fn test_search_criterion() {
        let catalog: Vec<Vessel> = serde_json::from_value(json!([
            { "id": 1, "slug": "miss-katie", "title": { "rendered": "Miss Katie" } },
            { "id": 2, "slug": "hull-2", "title": { "rendered": "Tank Barge 2" },
              "content": { "rendered": "<p>Twin screw, ABS classed</p>" } },
            { "id": 3, "slug": "hull-3", "title": { "rendered": "Deck Barge" } }
        ]))
        .unwrap();

        let criteria = VesselFilterValues::from_query([("search", " katie "), ("page", "2")]);
        assert_eq!(criteria.search.as_deref(), Some("katie"));
        let ids: Vec<u64> = filter_vessels(&catalog, &criteria).iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1]);

        let criteria = VesselFilterValues::from_query([("search", "TWIN SCREW")]);
        let ids: Vec<u64> = filter_vessels(&catalog, &criteria).iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![2]);

        let criteria = VesselFilterValues::from_query([("search", "barge"), ("type", "tugboat")]);
        assert!(filter_vessels(&catalog, &criteria).is_empty());

        assert!(VesselFilterValues::from_query([("search", "  ")]).is_empty());
    }

    #[test]
    fn test_from_query_ignores_unknown_type() {
        let criteria = VesselFilterValues::from_query([("type", "submarine"), ("has_price", "no")]);
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_clamp_range_to_bounds() {
        let bounds = Some(RangeBounds {
            min: 1950.0,
            max: 2020.0,
        });
        assert_eq!(clamp_range_to_bounds((1900.0, 2030.0), bounds), (1950.0, 2020.0));
        assert_eq!(clamp_range_to_bounds((1960.0, 2000.0), bounds), (1960.0, 2000.0));
        assert_eq!(clamp_range_to_bounds((1900.0, 2030.0), None), (1900.0, 2030.0));
    }

    #[test]
    fn test_clamp_to_only_touches_full_pairs() {
        let ranges = VesselFilterRanges {
            year_built: Some(RangeBounds {
                min: 1950.0,
                max: 2020.0,
            }),
            horsepower: Some(RangeBounds {
                min: 500.0,
                max: 4000.0,
            }),
            ..Default::default()
        };
        let criteria = VesselFilterValues {
            min_year: Some(1800.0),
            max_year: Some(2100.0),
            min_hp: Some(100.0),
            ..Default::default()
        }
        .clamp_to(&ranges);

        assert_eq!(criteria.min_year, Some(1950.0));
        assert_eq!(criteria.max_year, Some(2020.0));
        assert_eq!(criteria.min_hp, Some(100.0));
    }

    #[test]
    fn test_filter_vessels_keeps_order() {
        let catalog = vec![
            with_hp(1, Some(1000.0)),
            with_hp(2, Some(200.0)),
            with_hp(3, Some(3000.0)),
        ];
        let criteria = VesselFilterValues {
            min_hp: Some(500.0),
            ..Default::default()
        };
        let ids: Vec<u64> = filter_vessels(&catalog, &criteria)
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    fn catalog_strategy() -> impl Strategy<Value = Vec<Vessel>> {
        proptest::collection::vec(
            (
                proptest::option::of(1900u32..2025),
                proptest::option::of(100u32..10000),
                prop_oneof![Just("towboat"), Just("tugboat"), Just("barge"), Just("")],
            ),
            0..20,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (year, hp, kind))| {
                    vessel(
                        i as u64,
                        json!({
                            "vessel_type": kind,
                            "specs": {
                                "core_specs": { "year_built": year },
                                "propulsion_power_specs": { "horse_power": hp }
                            }
                        }),
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_empty_criteria_matches_everything(catalog in catalog_strategy()) {
            let criteria = VesselFilterValues::default();
            prop_assert!(catalog.iter().all(|v| criteria.matches(v)));
        }

        #[test]
        fn prop_ranges_widen_as_catalog_grows(catalog in catalog_strategy(), extra in catalog_strategy()) {
            let before = build_metadata(&catalog).ranges;
            let mut grown = catalog.clone();
            grown.extend(extra);
            let after = build_metadata(&grown).ranges;

            for (old, new) in [
                (before.year_built, after.year_built),
                (before.horsepower, after.horsepower),
            ] {
                if let Some(old) = old {
                    let new = new.unwrap();
                    prop_assert!(new.min <= old.min);
                    prop_assert!(new.max >= old.max);
                }
            }
        }

        #[test]
        fn prop_min_year_is_respected(catalog in catalog_strategy(), min_year in 1900u32..2025) {
            let criteria = VesselFilterValues {
                min_year: Some(min_year as f64),
                ..Default::default()
            };
            for v in filter_vessels(&catalog, &criteria) {
                prop_assert!(v.acf.year_built().is_some_and(|year| year >= min_year as f64));
            }
        }
    }
}
