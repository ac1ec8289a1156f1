use serde::{Deserialize, Serialize};

/// Product returned by the catalog lookup collaborator.
///
/// Catalog sources disagree on the name field (`name` vs `product_name`); the fallback is
/// applied once here so the rest of the client only ever sees `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProductLookup")]
pub struct ProductLookup {
    pub barcode: String,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub selling_price: Option<f64>,
}

impl ProductLookup {
    /// Display name, or `fallback` when the catalog had none.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }
}

#[derive(Deserialize)]
struct RawProductLookup {
    #[serde(default)]
    barcode: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    selling_price: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<RawProductLookup> for ProductLookup {
    fn from(raw: RawProductLookup) -> Self {
        Self {
            barcode: raw.barcode,
            name: non_blank(raw.name).or_else(|| non_blank(raw.product_name)),
            sku: non_blank(raw.sku),
            category: non_blank(raw.category),
            selling_price: raw.selling_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_field_preferred() {
        let p: ProductLookup =
            serde_json::from_str(r#"{"barcode":"1","name":"Water","product_name":"Old"}"#).unwrap();
        assert_eq!(p.name.as_deref(), Some("Water"));
    }

    #[test]
    fn test_product_name_fallback() {
        let p: ProductLookup =
            serde_json::from_str(r#"{"barcode":"1","name":"","product_name":"Rice 5kg"}"#)
                .unwrap();
        assert_eq!(p.name.as_deref(), Some("Rice 5kg"));
    }

    #[test]
    fn test_missing_name_uses_display_fallback() {
        let p: ProductLookup = serde_json::from_str(r#"{"barcode":"1","sku":" "}"#).unwrap();
        assert_eq!(p.name, None);
        assert_eq!(p.sku, None);
        assert_eq!(p.display_name("unnamed"), "unnamed");
    }
}
