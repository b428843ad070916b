//! Variant expansion.
//!
//! A single logical URL is stored once per combination of caching
//! dimensions. The expander computes that cross-product once per drain.

use std::fmt;

use super::config::DimensionConfig;

/// A caching dimension that splits one URL into several stored variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Device,
    Referrer,
    Cookie,
    Encryption,
    Compression,
}

impl Dimension {
    /// All dimensions in expansion order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Device,
        Dimension::Referrer,
        Dimension::Cookie,
        Dimension::Encryption,
        Dimension::Compression,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Device => "device",
            Dimension::Referrer => "referrer",
            Dimension::Cookie => "cookie",
            Dimension::Encryption => "encryption",
            Dimension::Compression => "compression",
        }
    }

    fn index(self) -> usize {
        match self {
            Dimension::Device => 0,
            Dimension::Referrer => 1,
            Dimension::Cookie => 2,
            Dimension::Encryption => 3,
            Dimension::Compression => 4,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered values of one dimension. The empty tag means "no variant".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDimension {
    dimension: Dimension,
    values: Vec<String>,
}

impl VariantDimension {
    /// Build a dimension, forcing the empty default tag into first position.
    pub fn new(dimension: Dimension, values: Vec<String>) -> Self {
        let mut ordered = vec![String::new()];
        for value in values {
            if !value.is_empty() && !ordered.contains(&value) {
                ordered.push(value);
            }
        }
        Self {
            dimension,
            values: ordered,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// One point of the dimension cross-product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Variant {
    values: [String; 5],
}

impl Variant {
    /// The tag this variant carries for `dimension` (empty = default).
    pub fn get(&self, dimension: Dimension) -> &str {
        &self.values[dimension.index()]
    }

    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.values[dimension.index()] = value.into();
        self
    }

    /// Returns true if every dimension holds its default tag.
    pub fn is_default(&self) -> bool {
        self.values.iter().all(String::is_empty)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for dimension in Dimension::ALL {
            let value = self.get(dimension);
            if value.is_empty() {
                continue;
            }
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{dimension}={value}")?;
            first = false;
        }
        if first {
            f.write_str("default")?;
        }
        Ok(())
    }
}

/// Computes the cross-product of active dimension values.
#[derive(Debug, Clone)]
pub struct VariantExpander {
    dimensions: Vec<VariantDimension>,
}

impl VariantExpander {
    /// Snapshot the active values of every dimension.
    pub fn from_config(config: &dyn DimensionConfig) -> Self {
        let dimensions = Dimension::ALL
            .into_iter()
            .map(|dimension| VariantDimension::new(dimension, config.active_values(dimension)))
            .collect();
        Self { dimensions }
    }

    pub fn dimensions(&self) -> &[VariantDimension] {
        &self.dimensions
    }

    /// Number of combinations visited per URL.
    pub fn cardinality(&self) -> usize {
        self.dimensions.iter().map(|d| d.values().len()).product()
    }

    /// All combinations, in deterministic order (last dimension varies fastest).
    pub fn expand(&self) -> Vec<Variant> {
        let mut variants = vec![Variant::default()];
        for dimension in &self.dimensions {
            let mut next = Vec::with_capacity(variants.len() * dimension.values().len());
            for variant in &variants {
                for value in dimension.values() {
                    next.push(variant.clone().with(dimension.dimension(), value.clone()));
                }
            }
            variants = next;
        }
        variants
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::cache::config::FlushConfig;

    #[test]
    fn default_config_yields_single_default_variant() {
        let expander = VariantExpander::from_config(&FlushConfig::default());
        let variants = expander.expand();
        assert_eq!(variants.len(), 1);
        assert!(variants[0].is_default());
        assert_eq!(variants[0].to_string(), "default");
    }

    #[test]
    fn cross_product_is_complete() {
        let config = FlushConfig {
            device_groups: vec!["mobile".to_string()],
            cache_ssl: true,
            compressions: vec!["gzip".to_string(), "br".to_string()],
            ..Default::default()
        };
        let expander = VariantExpander::from_config(&config);
        let variants = expander.expand();

        assert_eq!(expander.cardinality(), 2 * 2 * 3);
        assert_eq!(variants.len(), 12);

        let unique: HashSet<_> = variants.iter().collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn expansion_order_is_deterministic() {
        let config = FlushConfig {
            device_groups: vec!["mobile".to_string()],
            compressions: vec!["gzip".to_string()],
            ..Default::default()
        };
        let expander = VariantExpander::from_config(&config);
        let first = expander.expand();
        let second = expander.expand();
        assert_eq!(first, second);

        assert!(first[0].is_default());
        assert_eq!(first[1].get(Dimension::Compression), "gzip");
        assert_eq!(first[2].get(Dimension::Device), "mobile");
        assert_eq!(first[2].get(Dimension::Compression), "");
    }

    #[test]
    fn variant_dimension_forces_default_first() {
        let dimension = VariantDimension::new(
            Dimension::Referrer,
            vec!["search".to_string(), "".to_string(), "search".to_string()],
        );
        assert_eq!(dimension.values(), &["".to_string(), "search".to_string()]);
    }

    #[test]
    fn variant_display_lists_non_default_tags() {
        let variant = Variant::default()
            .with(Dimension::Device, "mobile")
            .with(Dimension::Encryption, "ssl");
        assert_eq!(variant.to_string(), "device=mobile,encryption=ssl");
    }
}
