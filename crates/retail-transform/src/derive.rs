//! Derivation stage: condition-set flag columns, unit normalization, and the
//! derived total.

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::debug;

use retail_common::{float_column, opt_string_column, set_f64_column, set_string_column};
use retail_model::{DerivedColumnRule, Result, UnitConversion};

/// Adds one 1/0 integer column per rule: 1 when the uppercased source value
/// is a member of the rule's condition set, 0 otherwise (nulls count as
/// non-members). Both rules are evaluated against the same input table.
pub fn derive_flags(
    df: &DataFrame,
    rule1: &DerivedColumnRule,
    rule2: &DerivedColumnRule,
) -> Result<DataFrame> {
    let mut out = df.clone();
    apply_flag(&mut out, rule1)?;
    apply_flag(&mut out, rule2)?;
    debug!(rows = out.height(), flag1 = %rule1.name, flag2 = %rule2.name, "flags derived");
    Ok(out)
}

fn apply_flag(df: &mut DataFrame, rule: &DerivedColumnRule) -> Result<()> {
    let conditions = rule.condition_set();
    let values = opt_string_column(df, &rule.source)?;
    let flags: Vec<i32> = values
        .iter()
        .map(|value| {
            let member = value
                .as_deref()
                .is_some_and(|value| conditions.contains(&value.to_uppercase()));
            i32::from(member)
        })
        .collect();
    df.with_column(Series::new(rule.name.as_str().into(), flags))?;
    Ok(())
}

/// Applies the unit-conversion rule.
///
/// Rows whose uppercased unit equals the trigger value get quantity
/// multiplied by the factor and price divided by it (rounded half-up to two
/// decimals); all other rows pass through unchanged. The normalized unit
/// column is set to the configured label on every row regardless of branch.
pub fn normalize_units(df: &DataFrame, conversion: &UnitConversion) -> Result<DataFrame> {
    let units = opt_string_column(df, &conversion.unit.name)?;
    let quantities = float_column(df, &conversion.quantity.name)?;
    let prices = float_column(df, &conversion.price.name)?;

    let trigger = conversion.unit.value.trim().to_uppercase();
    let factor = conversion.unit.factor;

    let mut new_quantities = Vec::with_capacity(df.height());
    let mut new_prices = Vec::with_capacity(df.height());
    let mut converted = 0usize;
    for ((unit, quantity), price) in units.iter().zip(&quantities).zip(&prices) {
        let triggered = unit
            .as_deref()
            .is_some_and(|unit| unit.to_uppercase() == trigger);
        if triggered {
            converted += 1;
            new_quantities.push(quantity.map(|q| q * factor));
            new_prices.push(price.map(|p| round2(p / factor)));
        } else {
            new_quantities.push(*quantity);
            new_prices.push(*price);
        }
    }

    let mut out = df.clone();
    set_f64_column(&mut out, &conversion.quantity.new_name, new_quantities)?;
    set_f64_column(&mut out, &conversion.price.new_name, new_prices)?;
    let label = conversion.unit.new_value.clone();
    set_string_column(
        &mut out,
        &conversion.unit.new_name,
        vec![label; df.height()],
    )?;
    debug!(rows = out.height(), converted, "units normalized");
    Ok(out)
}

/// Adds `total_column` = normalized quantity x normalized price. Null when
/// either factor is null.
pub fn derive_total(
    df: &DataFrame,
    quantity_column: &str,
    price_column: &str,
    total_column: &str,
) -> Result<DataFrame> {
    let quantities = float_column(df, quantity_column)?;
    let prices = float_column(df, price_column)?;
    let totals: Vec<Option<f64>> = quantities
        .iter()
        .zip(&prices)
        .map(|(quantity, price)| match (quantity, price) {
            (Some(q), Some(p)) => Some(q * p),
            _ => None,
        })
        .collect();
    let mut out = df.clone();
    set_f64_column(&mut out, total_column, totals)?;
    Ok(out)
}

/// Half-up rounding to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
