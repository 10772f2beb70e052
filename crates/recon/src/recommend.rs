use std::collections::HashSet;

use crate::config::PricingConfig;
use crate::model::{CatalogItem, ComparisonRow, PriceAction, PricingRow, Recommendation};

/// Recommend a price for every comparison row.
///
/// With `include_unmatched`, catalog SKUs without a comparison row are
/// appended (ascending SKU) and go through the no-competitor rules.
pub fn recommend(
    rows: &[ComparisonRow],
    catalog: &[CatalogItem],
    config: &PricingConfig,
) -> Vec<Recommendation> {
    let mut inputs: Vec<PricingRow> = rows.iter().map(PricingRow::from).collect();

    if config.include_unmatched {
        let compared: HashSet<&str> = rows.iter().map(|r| r.sku.as_str()).collect();
        let mut rest: Vec<&CatalogItem> = catalog
            .iter()
            .filter(|item| !compared.contains(item.sku.as_str()))
            .collect();
        rest.sort_by(|a, b| a.sku.cmp(&b.sku));
        inputs.extend(rest.into_iter().map(PricingRow::from));
    }

    inputs.iter().map(|row| recommend_row(row, config)).collect()
}

/// Apply the pricing rules to a single row. Stateless.
pub fn recommend_row(row: &PricingRow, config: &PricingConfig) -> Recommendation {
    let our = row.current_price;
    let min_allowed = config.min_allowed(row.cost);
    // Zero would divide the deviation by zero; treat it like missing data.
    let min_comp = row.min_comp_price.filter(|p| p.is_finite() && *p != 0.0);

    let (action, target, reason) = match min_comp {
        Some(min_comp) => decide_with_competitor(our, min_comp, min_allowed, config),
        None if our < min_allowed => (
            PriceAction::Increase,
            min_allowed,
            "price below minimum allowed".to_string(),
        ),
        None => (
            PriceAction::Keep,
            our,
            "no competitor data to compare".to_string(),
        ),
    };

    Recommendation {
        sku: row.sku.clone(),
        name: row.name.clone(),
        current_price: our,
        min_comp_price: row.min_comp_price,
        recommended_price: quantize(target, config.round_to),
        action,
        reason,
        min_allowed_price: min_allowed,
    }
}

fn decide_with_competitor(
    our: f64,
    min_comp: f64,
    min_allowed: f64,
    config: &PricingConfig,
) -> (PriceAction, f64, String) {
    let deviation = (our - min_comp) / min_comp;
    let tolerance = config.tolerance_percent / 100.0;

    if our > min_comp {
        let candidate = (min_comp - config.undercut_delta).max(min_allowed);
        if candidate < our {
            (
                PriceAction::Decrease,
                candidate,
                format!("price is {:.1}% above the lowest competitor", deviation * 100.0),
            )
        } else {
            (
                PriceAction::Keep,
                our,
                "decrease blocked by minimum margin".to_string(),
            )
        }
    } else if deviation.abs() <= tolerance {
        (
            PriceAction::Keep,
            our,
            format!("price within tolerance (±{:.1}%)", config.tolerance_percent),
        )
    } else {
        let candidate = (min_comp - config.raise_delta).min(min_allowed);
        // After the min() above the second condition always holds.
        if candidate > our && candidate > min_allowed {
            (
                PriceAction::Increase,
                candidate,
                format!("price well below market (gap: {:.2})", min_comp - our),
            )
        } else {
            (
                PriceAction::Keep,
                our,
                "increase not worthwhile or blocked by margin".to_string(),
            )
        }
    }
}

/// Round to the nearest multiple of `step` (ties to even). A non-positive
/// step leaves the price untouched.
pub fn quantize(price: f64, step: f64) -> f64 {
    if step > 0.0 {
        (price / step).round_ties_even() * step
    } else {
        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(our: f64, min_comp: Option<f64>, cost: f64) -> PricingRow {
        PricingRow {
            sku: "SKU-1".into(),
            name: "Widget".into(),
            cost,
            current_price: our,
            min_comp_price: min_comp,
        }
    }

    fn no_rounding() -> PricingConfig {
        PricingConfig { round_to: 0.0, ..PricingConfig::default() }
    }

    #[test]
    fn decrease_to_undercut() {
        let rec = recommend_row(&row(150.0, Some(100.0), 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Decrease);
        assert!((rec.recommended_price - 99.0).abs() < 1e-9);
        assert!((rec.min_allowed_price - 88.0).abs() < 1e-9);
        assert!(rec.reason.contains("50.0%"), "{}", rec.reason);
    }

    #[test]
    fn decrease_stops_at_margin_floor() {
        // min_comp - delta = 84 < floor 88, still below our price.
        let rec = recommend_row(&row(95.0, Some(85.0), 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Decrease);
        assert!((rec.recommended_price - 88.0).abs() < 1e-9);
    }

    #[test]
    fn keep_when_floor_blocks_cut() {
        // Floor 88 >= our 87.5, so no cut is possible.
        let rec = recommend_row(&row(87.5, Some(80.0), 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Keep);
        assert_eq!(rec.recommended_price, 87.5);
        assert_eq!(rec.reason, "decrease blocked by minimum margin");
    }

    #[test]
    fn keep_within_tolerance() {
        let rec = recommend_row(&row(99.0, Some(100.0), 50.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Keep);
        assert_eq!(rec.recommended_price, 99.0);
        assert_eq!(rec.reason, "price within tolerance (±1.5%)");
    }

    #[test]
    fn keep_when_far_below_but_floor_below_price() {
        let rec = recommend_row(&row(100.0, Some(150.0), 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Keep);
        assert_eq!(rec.recommended_price, 100.0);
        assert_eq!(rec.reason, "increase not worthwhile or blocked by margin");
    }

    #[test]
    fn raise_branch_never_increases() {
        // candidate = min(min_comp - raise_delta, floor) is never above the floor.
        for (our, min_comp, cost) in [(50.0, 200.0, 80.0), (10.0, 100.0, 90.0), (1.0, 5.0, 0.0)] {
            let rec = recommend_row(&row(our, Some(min_comp), cost), &no_rounding());
            assert_eq!(rec.action, PriceAction::Keep);
        }
    }

    #[test]
    fn increase_without_competitors() {
        let rec = recommend_row(&row(70.0, None, 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Increase);
        assert!((rec.recommended_price - 88.0).abs() < 1e-9);
        assert_eq!(rec.min_comp_price, None);
    }

    #[test]
    fn keep_without_competitors() {
        let rec = recommend_row(&row(120.0, None, 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Keep);
        assert_eq!(rec.recommended_price, 120.0);
        assert_eq!(rec.reason, "no competitor data to compare");
    }

    #[test]
    fn zero_competitor_price_is_missing_data() {
        let rec = recommend_row(&row(70.0, Some(0.0), 80.0), &no_rounding());
        assert_eq!(rec.action, PriceAction::Increase);
        assert_eq!(rec.min_comp_price, Some(0.0));
    }

    #[test]
    fn rounding_step() {
        assert_eq!(quantize(87.0, 5.0), 85.0);
        assert_eq!(quantize(88.0, 5.0), 90.0);
        assert_eq!(quantize(98.6, 1.0), 99.0);
        assert_eq!(quantize(87.0, 0.0), 87.0);
        assert_eq!(quantize(87.0, -1.0), 87.0);
        // ties go to the even multiple
        assert_eq!(quantize(2.5, 1.0), 2.0);
    }

    #[test]
    fn rounding_applies_to_kept_price() {
        let config = PricingConfig { round_to: 5.0, ..PricingConfig::default() };
        let rec = recommend_row(&row(121.0, None, 80.0), &config);
        assert_eq!(rec.action, PriceAction::Keep);
        assert_eq!(rec.recommended_price, 120.0);
    }

    fn comparison(sku: &str, our: f64, min_comp: f64) -> ComparisonRow {
        ComparisonRow {
            sku: sku.into(),
            name: sku.into(),
            brand: "b".into(),
            category: "c".into(),
            cost: 80.0,
            current_price: our,
            min_comp_price: min_comp,
            max_comp_price: min_comp,
            avg_comp_price: min_comp,
            price_difference: our - min_comp,
            price_position: crate::model::PricePosition::AboveMin,
            competitors: 1,
            comp_products: vec![],
        }
    }

    fn catalog_item(sku: &str, our: f64) -> CatalogItem {
        CatalogItem {
            sku: sku.into(),
            name: sku.into(),
            brand: "b".into(),
            category: "c".into(),
            cost: 80.0,
            current_price: our,
        }
    }

    #[test]
    fn unmatched_catalog_rows_are_opt_in() {
        let rows = vec![comparison("SKU-2", 150.0, 100.0)];
        let catalog = vec![
            catalog_item("SKU-3", 70.0),
            catalog_item("SKU-1", 100.0),
            catalog_item("SKU-2", 150.0),
        ];

        let recs = recommend(&rows, &catalog, &PricingConfig::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].action, PriceAction::Decrease);
        assert_eq!(recs[0].recommended_price, 99.0);

        let config = PricingConfig { include_unmatched: true, ..PricingConfig::default() };
        let recs = recommend(&rows, &catalog, &config);
        let skus: Vec<&str> = recs.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, ["SKU-2", "SKU-1", "SKU-3"]);
        assert_eq!(recs[1].action, PriceAction::Keep);
        assert_eq!(recs[2].action, PriceAction::Increase);
        assert_eq!(recs[2].recommended_price, 88.0);
    }

    #[test]
    fn empty_rows() {
        assert!(recommend(&[], &[], &PricingConfig::default()).is_empty());
    }
}
