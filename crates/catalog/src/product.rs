use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{AggregateRoot, DomainError, ProductId};

/// Aggregate root: Product.
///
/// `price` is a display string (e.g. `₹299`) and is snapshotted verbatim into
/// order line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub image: String,
    pub stock: i64,
    #[serde(default)]
    pub features: Vec<String>,
    pub full_description: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub care_instructions: Option<String>,
    pub material: Option<String>,
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Product {
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Apply an admin edit. Validation runs on the edited copy so a rejected
    /// patch leaves `self` untouched.
    pub fn apply_patch(&mut self, patch: ProductPatch) -> Result<(), DomainError> {
        let mut next = self.clone();

        if let Some(v) = patch.name {
            next.name = v;
        }
        if let Some(v) = patch.category {
            next.category = v;
        }
        if let Some(v) = patch.price {
            next.price = v;
        }
        if let Some(v) = patch.description {
            next.description = v;
        }
        if let Some(v) = patch.image {
            next.image = v;
        }
        if let Some(v) = patch.stock {
            next.stock = v;
        }
        if let Some(v) = patch.features {
            next.features = clean_list(v);
        }
        if let Some(v) = patch.full_description {
            next.full_description = non_blank(v);
        }
        if let Some(v) = patch.sizes {
            next.sizes = clean_list(v);
        }
        if let Some(v) = patch.colors {
            next.colors = clean_list(v);
        }
        if let Some(v) = patch.care_instructions {
            next.care_instructions = non_blank(v);
        }
        if let Some(v) = patch.material {
            next.material = non_blank(v);
        }
        if let Some(v) = patch.origin {
            next.origin = non_blank(v);
        }

        next.validate()?;
        next.version += 1;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("price", &self.price),
            ("description", &self.description),
            ("image", &self.image),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} is required")));
            }
        }
        ensure_stock_non_negative(self.stock)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// `stock >= 0` must hold after every admin mutation.
pub fn ensure_stock_non_negative(stock: i64) -> Result<(), DomainError> {
    if stock < 0 {
        Err(DomainError::validation("stock cannot be negative"))
    } else {
        Ok(())
    }
}

/// Command: create a product (admin).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub image: String,
    pub stock: i64,
    pub features: Vec<String>,
    pub full_description: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub care_instructions: Option<String>,
    pub material: Option<String>,
    pub origin: Option<String>,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Result<Product, DomainError> {
        let product = Product {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            price: self.price.trim().to_string(),
            description: self.description,
            image: self.image.trim().to_string(),
            stock: self.stock,
            features: clean_list(self.features),
            full_description: self.full_description.and_then(non_blank),
            sizes: clean_list(self.sizes),
            colors: clean_list(self.colors),
            care_instructions: self.care_instructions.and_then(non_blank),
            material: self.material.and_then(non_blank),
            origin: self.origin.and_then(non_blank),
            created_at: now,
            version: 1,
        };
        product.validate()?;
        Ok(product)
    }
}

/// Command: partial admin edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i64>,
    pub features: Option<Vec<String>>,
    pub full_description: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub care_instructions: Option<String>,
    pub material: Option<String>,
    pub origin: Option<String>,
}

// The admin form submits comma-split lists, which leave blanks and padding.
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_blank(s: String) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> NewProduct {
        NewProduct {
            name: "Linen Shirt".to_string(),
            category: "Shirts".to_string(),
            price: "₹1299".to_string(),
            description: "Breathable linen".to_string(),
            image: "/img/linen.jpg".to_string(),
            stock: 5,
            features: vec![" breathable ".to_string(), "".to_string()],
            sizes: vec!["S".to_string(), "M".to_string(), " ".to_string()],
            ..NewProduct::default()
        }
    }

    #[test]
    fn create_trims_lists_and_starts_at_version_one() {
        let p = shirt().into_product(ProductId::new(), Utc::now()).unwrap();
        assert_eq!(p.features, vec!["breathable"]);
        assert_eq!(p.sizes, vec!["S", "M"]);
        assert_eq!(p.version(), 1);
        assert!(p.has_stock_for(5));
        assert!(!p.has_stock_for(6));
    }

    #[test]
    fn create_rejects_missing_required_fields() {
        let mut np = shirt();
        np.image = "  ".to_string();
        let err = np.into_product(ProductId::new(), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("image is required"));
    }

    #[test]
    fn create_rejects_negative_stock() {
        let mut np = shirt();
        np.stock = -1;
        assert!(np.into_product(ProductId::new(), Utc::now()).is_err());
    }

    #[test]
    fn rejected_patch_leaves_product_untouched() {
        let mut p = shirt().into_product(ProductId::new(), Utc::now()).unwrap();
        let before = p.clone();

        let err = p
            .apply_patch(ProductPatch {
                name: Some("Renamed".to_string()),
                stock: Some(-3),
                ..ProductPatch::default()
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut p = shirt().into_product(ProductId::new(), Utc::now()).unwrap();
        p.apply_patch(ProductPatch {
            stock: Some(12),
            material: Some("Linen".to_string()),
            ..ProductPatch::default()
        })
        .unwrap();

        assert_eq!(p.stock, 12);
        assert_eq!(p.material.as_deref(), Some("Linen"));
        assert_eq!(p.name, "Linen Shirt");
        assert_eq!(p.version(), 2);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: no accepted patch leaves stock negative.
            #[test]
            fn accepted_patch_never_negative(stock in -1000i64..1000) {
                let mut p = shirt().into_product(ProductId::new(), Utc::now()).unwrap();
                let res = p.apply_patch(ProductPatch { stock: Some(stock), ..ProductPatch::default() });
                prop_assert_eq!(res.is_ok(), stock >= 0);
                prop_assert!(p.stock >= 0);
            }
        }
    }
}
