/// The admissible price interval for one row.
///
/// The interval is symmetric around the row's average unit price, with a
/// half-width that depends on the article category and the sales channel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceRange {
    /// The smallest admissible price
    pub price_min: f64,
    /// The largest admissible price
    pub price_max: f64,
}

impl PriceRange {
    /// Build the interval `[(1 - fraction) * center, (1 + fraction) * center]`
    pub fn around(center: f64, fraction: f64) -> Self {
        Self {
            price_min: (1.0 - fraction) * center,
            price_max: (1.0 + fraction) * center,
        }
    }

    /// Whether `price` lies in the closed interval
    pub fn contains(&self, price: f64) -> bool {
        self.price_min <= price && price <= self.price_max
    }

    /// Intersect the interval with `[floor, +∞)`, returning `None` if the
    /// result is empty.
    pub fn with_floor(&self, floor: f64) -> Option<Self> {
        let price_min = self.price_min.max(floor);
        (price_min <= self.price_max).then_some(Self {
            price_min,
            price_max: self.price_max,
        })
    }

    /// Project `price` onto the interval
    pub fn clamp(&self, price: f64) -> f64 {
        price.clamp(self.price_min, self.price_max)
    }
}
