// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Role-bound columns and the features built from them.

use std::collections::BTreeMap;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use super::Value;

/// Logical role a column can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Location name joined against vector tile features.
    Location,
    /// Latitude in degrees.
    Latitude,
    /// Longitude in degrees.
    Longitude,
    /// Value driving the color encoding.
    Color,
    /// Value driving the size encoding.
    Size,
    /// Extra values shown in tooltips.
    Tooltips,
    /// Value aggregated by the cluster layer.
    Cluster,
}

/// One column of the input table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Name shown to the user and used as the feature property key.
    pub display_name: String,
    /// Roles this column is bound to.
    pub roles: Vec<Role>,
    /// Whether the column holds a numeric measure.
    pub numeric: bool,
    /// Cell values, one per row.
    pub values: Vec<Value>,
}

impl Column {
    /// Creates a numeric column.
    #[must_use]
    pub fn numeric(name: &str, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            display_name: name.to_owned(),
            roles: Vec::new(),
            numeric: true,
            values: values.into_iter().map(Value::Number).collect(),
        }
    }

    /// Creates a categorical column.
    #[must_use]
    pub fn text<S: Into<String>>(name: &str, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            display_name: name.to_owned(),
            roles: Vec::new(),
            numeric: false,
            values: values.into_iter().map(|s| Value::Text(s.into())).collect(),
        }
    }

    /// Binds this column to `role`.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Returns true if the column is bound to `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// A point (or location-keyed) row of the input table.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// Row index, stable for the lifetime of one data set.
    pub id: u64,
    /// Position as (longitude, latitude), if both are bound and numeric.
    pub position: Option<Point>,
    /// Every column value of the row, keyed by display name.
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    /// Returns the property value bound to `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Returns this feature as a GeoJSON `Feature` object, or `None` when it
    /// has no position.
    #[must_use]
    pub fn to_geojson(&self) -> Option<serde_json::Value> {
        let p = self.position?;
        let properties: serde_json::Map<String, serde_json::Value> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Some(serde_json::json!({
            "type": "Feature",
            "id": self.id,
            "geometry": { "type": "Point", "coordinates": [p.x, p.y] },
            "properties": properties,
        }))
    }
}

/// Lookup from logical role to bound column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoleMap {
    columns: Vec<Column>,
}

impl RoleMap {
    /// Creates a role map over `columns`.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Returns the `index`-th column bound to `role`.
    #[must_use]
    pub fn get(&self, role: Role, index: usize) -> Option<&Column> {
        self.get_all(role).nth(index)
    }

    /// Returns every column bound to `role`, in input order.
    pub fn get_all(&self, role: Role) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.has_role(role))
    }

    /// Returns the name of the latitude column.
    #[must_use]
    pub fn latitude(&self) -> Option<&str> {
        self.get(Role::Latitude, 0).map(|c| c.display_name.as_str())
    }

    /// Returns the name of the longitude column.
    #[must_use]
    pub fn longitude(&self) -> Option<&str> {
        self.get(Role::Longitude, 0).map(|c| c.display_name.as_str())
    }

    /// Returns the name of the location column.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.get(Role::Location, 0).map(|c| c.display_name.as_str())
    }

    /// Returns the color column a layer selected with its 1-based
    /// `colorField` setting.
    ///
    /// Out-of-range selections fall back to the first color column.
    #[must_use]
    pub fn color(&self, color_field: usize) -> Option<&Column> {
        let index = color_field.saturating_sub(1);
        self.get(Role::Color, index)
            .or_else(|| self.get(Role::Color, 0))
    }

    /// Returns the size column.
    #[must_use]
    pub fn size(&self) -> Option<&Column> {
        self.get(Role::Size, 0)
    }

    /// Returns the cluster column.
    #[must_use]
    pub fn cluster(&self) -> Option<&Column> {
        self.get(Role::Cluster, 0)
    }

    /// Returns the tooltip columns.
    pub fn tooltips(&self) -> impl Iterator<Item = &Column> {
        self.get_all(Role::Tooltips)
    }

    /// Number of rows (length of the longest column).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    /// Converts every row into a [`Feature`].
    ///
    /// Rows whose latitude or longitude is missing or non-numeric get no
    /// position; they still take part in location joins.
    #[must_use]
    pub fn features(&self) -> Vec<Feature> {
        let lat = self.get(Role::Latitude, 0);
        let lon = self.get(Role::Longitude, 0);
        (0..self.row_count())
            .map(|row| {
                let coord = |c: Option<&Column>| c?.values.get(row)?.as_number();
                let position = match (coord(lon), coord(lat)) {
                    (Some(x), Some(y)) => Some(Point::new(x, y)),
                    _ => None,
                };
                let properties = self
                    .columns
                    .iter()
                    .filter_map(|c| Some((c.display_name.clone(), c.values.get(row)?.clone())))
                    .collect();
                Feature {
                    id: row as u64,
                    position,
                    properties,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoleMap {
        RoleMap::new(vec![
            Column::numeric("lat", [47.5, 48.0, f64::NAN]).with_role(Role::Latitude),
            Column::numeric("lon", [19.0, 2.3, 4.0]).with_role(Role::Longitude),
            Column::numeric("pop", [1.7, 2.1, 0.5]).with_role(Role::Color),
            Column::text("kind", ["a", "b", "a"]).with_role(Role::Color),
            Column::text("city", ["Budapest", "Paris", "Nowhere"]).with_role(Role::Tooltips),
        ])
    }

    #[test]
    fn color_field_is_one_based_with_fallback() {
        let roles = sample();
        assert_eq!(roles.color(1).map(|c| c.display_name.as_str()), Some("pop"));
        assert_eq!(roles.color(2).map(|c| c.display_name.as_str()), Some("kind"));
        assert_eq!(roles.color(9).map(|c| c.display_name.as_str()), Some("pop"));
        assert!(roles.size().is_none(), "no size column is bound");
    }

    #[test]
    fn features_skip_positions_with_missing_coordinates() {
        let features = sample().features();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].position, Some(Point::new(19.0, 47.5)));
        assert_eq!(features[2].position, None);
        assert_eq!(features[1].property("city"), Some(&Value::from("Paris")));
        assert!(features[2].to_geojson().is_none(), "no geometry without position");
    }

    #[test]
    fn geojson_carries_coordinates_and_properties() {
        let features = sample().features();
        let json = features[0].to_geojson().unwrap();
        assert_eq!(json["geometry"]["coordinates"], serde_json::json!([19.0, 47.5]));
        assert_eq!(json["properties"]["kind"], "a");
    }
}
