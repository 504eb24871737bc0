// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for classification, stop generation, layer ordering and
//! source reference counting.

use cartolayer_core::backend::{LayerType, MapRenderer};
use cartolayer_core::classify::{ClassificationMethod, Classifier};
use cartolayer_core::data::{Column, Limits, Role, RoleMap, Value};
use cartolayer_core::layer::LayerKind;
use cartolayer_core::map::ThematicMap;
use cartolayer_core::memory::{MemoryRenderer, RendererCall};
use cartolayer_core::settings::{LabelPosition, MapSettings};
use cartolayer_core::source::{Datasource, PointSource};
use cartolayer_core::stops::{CategoryPalette, ColorRampSettings, generate_color_stops};
use cartolayer_core::trace::Tracer;
use proptest::prelude::*;

fn ramp<'a>() -> ColorRampSettings<'a> {
    ColorRampSettings {
        diverging: false,
        min_color: "#000000",
        mid_color: "#808080",
        max_color: "#ffffff",
        min_value: None,
        mid_value: None,
        max_value: None,
    }
}

fn limits(values: &[f64]) -> Limits {
    Limits::from_values(values.iter().copied().map(Value::Number).collect())
}

fn stop_numbers(stops: &[cartolayer_core::stops::ColorStop]) -> Vec<f64> {
    stops.iter().filter_map(|s| s.stop.as_number()).collect()
}

fn method() -> impl Strategy<Value = ClassificationMethod> {
    prop_oneof![
        Just(ClassificationMethod::Quantile),
        Just(ClassificationMethod::EqualInterval),
    ]
}

fn kind_of(id: &str) -> Option<LayerKind> {
    LayerKind::ALL
        .into_iter()
        .find(|k| k.sub_layers().contains(&id))
}

fn settings_for(mask: u8, labels_above: bool) -> MapSettings {
    let mut s = MapSettings::default();
    s.raster.show = mask & 1 != 0;
    s.raster.url = "https://tiles.example/{z}/{x}/{y}.png".to_owned();
    s.choropleth.show = mask & 2 != 0;
    s.circle.show = mask & 4 != 0;
    s.heatmap.show = mask & 8 != 0;
    s.cluster.show = mask & 16 != 0;
    s.symbol.show = mask & 32 != 0;
    s.api.autozoom = false;
    s.api.label_position = if labels_above {
        LabelPosition::Above
    } else {
        LabelPosition::Below
    };
    s
}

fn roles() -> RoleMap {
    RoleMap::new(vec![
        Column::numeric("lat", [48.85, 40.7, -33.9]).with_role(Role::Latitude),
        Column::numeric("lon", [2.35, -74.0, 151.2]).with_role(Role::Longitude),
        Column::numeric("sales", [4.0, 6.0, 1.0]).with_role(Role::Color),
        Column::text("country", ["France", "USA", "Australia"]).with_role(Role::Location),
    ])
}

proptest! {
    #[test]
    fn breaks_are_ordered_and_bounded(
        values in prop::collection::vec(-1000_i32..1000, 2..60),
        method in method(),
        max_classes in 2_usize..10,
    ) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let classifier = Classifier::new(method, max_classes);
        let count = classifier.class_count(&values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(min < max);
        prop_assert!(count >= 2 && count <= max_classes);

        let breaks = classifier.breaks(&values, count);
        prop_assert_eq!(breaks.len(), count);
        prop_assert!(breaks.windows(2).all(|w| w[0] <= w[1]), "breaks {:?}", breaks);
        prop_assert!(breaks.iter().all(|b| (min..=max).contains(b)), "breaks {:?}", breaks);
        prop_assert_eq!(breaks[0], min);
        prop_assert_eq!(breaks[count - 1], max);
    }

    #[test]
    fn single_value_yields_one_stop(value in -1e6_f64..1e6, copies in 1_usize..20) {
        let values = vec![value; copies];
        let stops = generate_color_stops(
            &ramp(),
            true,
            &limits(&values),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        prop_assert_eq!(stops.len(), 1);
        prop_assert_eq!(stops[0].color.as_str(), "#000000");
        prop_assert_eq!(stops[0].stop.as_number(), Some(value));
    }

    #[test]
    fn diverging_midpoint_appears_once(
        mid in -100_i32..100,
        below in 1_i32..100,
        above in 1_i32..100,
        samples in prop::collection::vec(0.0_f64..1.0, 1..40),
    ) {
        let (lo, mid, hi) = (f64::from(mid - below), f64::from(mid), f64::from(mid + above));
        let values: Vec<f64> = samples.iter().map(|t| (lo + (hi - lo) * t).round()).collect();
        let mut settings = ramp();
        settings.diverging = true;
        settings.min_value = Some(lo);
        settings.mid_value = Some(mid);
        settings.max_value = Some(hi);

        let stops = generate_color_stops(
            &settings,
            true,
            &limits(&values),
            &CategoryPalette::default(),
            &Classifier::default(),
        );
        let v = stop_numbers(&stops);
        let at = v.iter().position(|x| *x == mid);
        prop_assert_eq!(v.iter().filter(|x| **x == mid).count(), 1, "stops {:?}", v);
        let at = at.unwrap_or_default();
        prop_assert!(v[..at].iter().all(|x| *x <= mid), "lower half {:?}", v);
        prop_assert!(v[at..].iter().all(|x| *x >= mid), "upper half {:?}", v);
        prop_assert!(v.windows(2).all(|w| w[0] < w[1]), "ascending {:?}", v);
    }

    #[test]
    fn layers_keep_their_order_under_any_visibility_sequence(
        steps in prop::collection::vec((0_u8..64, any::<bool>()), 1..12),
    ) {
        let mut renderer = MemoryRenderer::with_base_layers(&[
            ("background", LayerType::Background),
            ("water", LayerType::Fill),
            ("road-label", LayerType::Symbol),
            ("place-label", LayerType::Symbol),
        ]);
        let mut map = ThematicMap::new();
        for (mask, above) in steps {
            let report = map
                .update(&mut renderer, settings_for(mask, above), roles(), &mut Tracer::none(), || {})
                .expect("no style switch");
            prop_assert!(report.is_ok(), "errors {:?}", report.errors);

            let ids = renderer.data_layer_ids();
            let kinds: Vec<LayerKind> = ids.iter().filter_map(|id| kind_of(id)).collect();
            prop_assert_eq!(kinds.len(), ids.len());
            prop_assert!(kinds.windows(2).all(|w| w[0] <= w[1]), "order {:?}", ids);

            let mut shown: Vec<LayerKind> = kinds.clone();
            shown.dedup();
            let expected: Vec<LayerKind> = LayerKind::ALL
                .into_iter()
                .filter(|k| mask & (1 << k.index()) != 0)
                .collect();
            prop_assert_eq!(shown, expected);

            for kind in LayerKind::ALL {
                let subs: Vec<&str> = ids
                    .iter()
                    .map(String::as_str)
                    .filter(|id| kind_of(id) == Some(kind))
                    .collect();
                if !subs.is_empty() {
                    prop_assert_eq!(subs.as_slice(), kind.sub_layers());
                }
            }

            let all = renderer.layer_ids();
            let label = all.iter().position(|id| id == "road-label");
            let below_labels = |id: &str| all.iter().position(|x| x == id) < label;
            if let Some(first) = ids.iter().find(|id| kind_of(id) == Some(LayerKind::Choropleth)) {
                prop_assert!(below_labels(first), "choropleth above labels: {:?}", all);
            }
            if above {
                prop_assert!(ids.iter().all(|id| below_labels(id)), "stack {:?}", all);
            }
        }
    }

    #[test]
    fn shared_source_is_torn_down_exactly_once(
        owners in prop::sample::subsequence(
            vec![LayerKind::Circle, LayerKind::Heatmap, LayerKind::Symbol], 1..=3),
        releases in prop::collection::vec(
            prop::sample::select(vec![LayerKind::Circle, LayerKind::Heatmap, LayerKind::Symbol]),
            0..10),
    ) {
        let settings = MapSettings::default();
        let mut renderer = MemoryRenderer::new();
        let mut source = PointSource::new();
        for kind in &owners {
            source.ensure(&mut renderer, *kind, &settings, &mut Tracer::none()).unwrap();
        }
        for kind in releases.iter().chain(&owners).chain(&owners) {
            source.remove_from_map(&mut renderer, *kind, &mut Tracer::none()).unwrap();
            prop_assert_eq!(renderer.source("data").is_some(), source.refs().is_referenced());
        }
        prop_assert_eq!(renderer.count(|c| matches!(c, RendererCall::AddSource(_))), 1);
        prop_assert_eq!(renderer.count(|c| matches!(c, RendererCall::RemoveSource(_))), 1);
        prop_assert!(!source.refs().is_referenced());
    }
}
