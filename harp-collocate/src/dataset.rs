//! §3 "Dataset": ordered product-metadata records, sortable by
//! `(datetime_start, datetime_stop)` ascending, ties broken by
//! `source_product`.

/// One entry of a [`Dataset`]: just enough to drive the sweep's time-window
/// pre-filter (§4.8) without loading the product itself. `datetime_start`
/// and `datetime_stop` are seconds since an arbitrary but fixed epoch —
/// the collocation engine never interprets the epoch, only differences.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMetadata {
    pub source_product: String,
    pub filename: String,
    pub datetime_start: f64,
    pub datetime_stop: f64,
}

impl ProductMetadata {
    pub fn new(source_product: impl Into<String>, filename: impl Into<String>, datetime_start: f64, datetime_stop: f64) -> Self {
        ProductMetadata {
            source_product: source_product.into(),
            filename: filename.into(),
            datetime_start,
            datetime_stop,
        }
    }
}

/// An ordered list of [`ProductMetadata`] records (§3 Dataset).
///
/// `run` (see [`crate::engine`]) sorts its own copy before sweeping, so
/// callers don't have to remember to call [`Dataset::sort`] themselves —
/// but the canonical iteration order, and therefore `collocation_index`
/// assignment, is always this sorted order, never insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    products: Vec<ProductMetadata>,
}

impl Dataset {
    pub fn new(products: Vec<ProductMetadata>) -> Self {
        Dataset { products }
    }

    pub fn push(&mut self, metadata: ProductMetadata) {
        self.products.push(metadata);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductMetadata> {
        self.products.iter()
    }

    /// Sort in place by `(datetime_start, datetime_stop)` ascending, ties
    /// broken by `source_product` — the canonical order §4.8 requires.
    pub fn sort(&mut self) {
        self.products.sort_by(|a, b| {
            a.datetime_start
                .partial_cmp(&b.datetime_start)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.datetime_stop.partial_cmp(&b.datetime_stop).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.source_product.cmp(&b.source_product))
        });
    }

    /// A copy of this dataset, sorted per [`Dataset::sort`].
    pub fn sorted(&self) -> Dataset {
        let mut copy = self.clone();
        copy.sort();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_start_then_stop_then_source_product() {
        let mut ds = Dataset::new(vec![
            ProductMetadata::new("B", "b.nc", 10.0, 20.0),
            ProductMetadata::new("A", "a.nc", 5.0, 15.0),
            ProductMetadata::new("C", "c.nc", 5.0, 12.0),
        ]);
        ds.sort();
        let order: Vec<&str> = ds.iter().map(|m| m.source_product.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn sorted_does_not_mutate_the_original() {
        let ds = Dataset::new(vec![ProductMetadata::new("B", "b.nc", 2.0, 3.0), ProductMetadata::new("A", "a.nc", 1.0, 2.0)]);
        let sorted = ds.sorted();
        assert_eq!(ds.iter().next().unwrap().source_product, "B");
        assert_eq!(sorted.iter().next().unwrap().source_product, "A");
    }
}
