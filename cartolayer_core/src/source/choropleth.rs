// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector tile regions joined to data rows by location.
//!
//! The geometry lives in the vector tiles; the data set only contributes one
//! value per location and color field. Rows sharing a location are summed
//! when numeric; for text values the first row wins.

use std::collections::BTreeMap;

use super::{Datasource, SourceKey, SourceRefs};
use crate::backend::{MapRenderer, SourceDescriptor};
use crate::data::{Feature, Limits, Role, RoleMap, Value};
use crate::error::RendererError;
use crate::settings::MapSettings;

/// Per-location values for every color field.
#[derive(Clone, Debug)]
pub struct ChoroplethSource {
    refs: SourceRefs,
    fields: Vec<Vec<(String, Value)>>,
}

impl ChoroplethSource {
    /// Creates an unreferenced choropleth source with no data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refs: SourceRefs::new(SourceKey::Choropleth),
            fields: Vec::new(),
        }
    }
}

impl Default for ChoroplethSource {
    fn default() -> Self {
        Self::new()
    }
}

fn join_by_location(locations: &[Value], values: &[Value]) -> Vec<(String, Value)> {
    let mut order: Vec<String> = Vec::new();
    let mut joined: BTreeMap<String, Value> = BTreeMap::new();
    for (location, value) in locations.iter().zip(values) {
        let key = location.to_string();
        if let Some(existing) = joined.get_mut(&key) {
            if let (Value::Number(acc), Value::Number(v)) = (existing, value) {
                *acc += v;
            }
        } else {
            order.push(key.clone());
            joined.insert(key, value.clone());
        }
    }
    order
        .into_iter()
        .filter_map(|k| joined.remove_entry(&k))
        .collect()
}

impl Datasource for ChoroplethSource {
    fn refs(&self) -> &SourceRefs {
        &self.refs
    }

    fn refs_mut(&mut self) -> &mut SourceRefs {
        &mut self.refs
    }

    fn creates_on_ensure(&self) -> bool {
        true
    }

    fn descriptor(&self, settings: &MapSettings) -> SourceDescriptor {
        SourceDescriptor::Vector {
            url: settings.choropleth.vector_tile_url.clone(),
        }
    }

    fn update(
        &mut self,
        _renderer: &mut dyn MapRenderer,
        roles: &RoleMap,
        _features: &[Feature],
        _settings: &MapSettings,
    ) -> Result<(), RendererError> {
        let Some(location) = roles.get(Role::Location, 0) else {
            self.fields.clear();
            return Ok(());
        };
        self.fields = roles
            .get_all(Role::Color)
            .map(|c| join_by_location(&location.values, &c.values))
            .collect();
        Ok(())
    }

    /// Pairs are in first-seen location order.
    fn location_values(&self, field: usize) -> &[(String, Value)] {
        self.fields
            .get(field)
            .or_else(|| self.fields.first())
            .map_or(&[][..], Vec::as_slice)
    }

    fn color_limits(&self, field: usize) -> Limits {
        if self.fields.is_empty() {
            return Limits::empty();
        }
        Limits::from_values(
            self.location_values(field)
                .iter()
                .map(|(_, v)| v.clone())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::memory::MemoryRenderer;

    #[test]
    fn rows_are_summed_per_location() {
        let roles = RoleMap::new(vec![
            Column::text("country", ["France", "Spain", "France"]).with_role(Role::Location),
            Column::numeric("sales", [2.0, 5.0, 3.0]).with_role(Role::Color),
        ]);
        let mut source = ChoroplethSource::new();
        source
            .update(
                &mut MemoryRenderer::new(),
                &roles,
                &[],
                &MapSettings::default(),
            )
            .unwrap();
        assert_eq!(
            source.location_values(0),
            [
                ("France".to_owned(), Value::from(5.0)),
                ("Spain".to_owned(), Value::from(5.0)),
            ]
        );
        let limits = source.color_limits(0);
        assert_eq!((limits.min, limits.max), (Some(5.0), Some(5.0)));
    }

    #[test]
    fn missing_location_role_gives_neutral_limits() {
        let roles = RoleMap::new(vec![
            Column::numeric("sales", [2.0, 5.0]).with_role(Role::Color),
        ]);
        let mut source = ChoroplethSource::new();
        source
            .update(
                &mut MemoryRenderer::new(),
                &roles,
                &[],
                &MapSettings::default(),
            )
            .unwrap();
        assert!(source.color_limits(0).is_empty(), "nothing to join on");
        assert!(source.location_values(0).is_empty(), "no locations");
    }
}
