use rpo_core::models::{ConfigurationError, PriceRange, RangeTable};

/// Compute the admissible price range for a row.
///
/// The half-width of the range is the category's fraction for `channel`
/// (channels without a column use the public column) applied to
/// `avg_unit_price`. A category missing from the table is an error, never
/// silently defaulted.
pub fn price_range(
    table: &RangeTable,
    category: &str,
    channel: &str,
    avg_unit_price: f64,
) -> Result<PriceRange, ConfigurationError> {
    let fraction = table.fraction(category, channel)?;
    Ok(PriceRange::around(avg_unit_price, fraction))
}
