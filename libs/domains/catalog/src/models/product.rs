use chrono::{DateTime, Utc};
use domain_kernel::{Description, Money, Name, Sku};

use super::Category;
use crate::error::{CatalogError, CatalogResult};

/// Sellable item. The SKU is fixed once created.
#[derive(Debug, Clone)]
pub struct Product {
    pub(crate) id: Option<i32>,
    pub(crate) sku: Sku,
    pub(crate) name: Name,
    pub(crate) description: Description,
    pub(crate) price: Money,
    pub(crate) category_id: Option<i32>,
    pub(crate) is_active: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// A new active product. `category`, when given, must be saved and active.
    pub fn new(
        sku: Sku,
        name: Name,
        description: Description,
        price: Money,
        category: Option<&Category>,
    ) -> CatalogResult<Self> {
        Ok(Self {
            id: None,
            sku,
            name,
            description,
            price,
            category_id: category.map(Self::check_category).transpose()?,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn price(&self) -> &Money {
        &self.price
    }

    pub fn category_id(&self) -> Option<i32> {
        self.category_id
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn update_details(
        &mut self,
        name: Name,
        description: Description,
        price: Money,
        is_active: bool,
    ) {
        self.name = name;
        self.description = description;
        self.price = price;
        self.is_active = is_active;
        self.touch();
    }

    /// Assign to `category` or leave uncategorized with `None`.
    pub fn set_category(&mut self, category: Option<&Category>) -> CatalogResult<()> {
        self.category_id = category.map(Self::check_category).transpose()?;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    fn check_category(category: &Category) -> CatalogResult<i32> {
        let id = category.id.ok_or_else(|| {
            CatalogError::validation("category_id", "Category must be saved first")
        })?;
        if !category.is_active {
            return Err(CatalogError::InactiveCategory(id));
        }
        Ok(id)
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        super::same_identity(self.id, other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_kernel::Decimal;

    fn category(id: i32, active: bool) -> Category {
        let mut category =
            Category::new(Name::parse("Tools").unwrap(), Description::empty(), None).unwrap();
        category.id = Some(id);
        category.is_active = active;
        category
    }

    fn product(category: Option<&Category>) -> CatalogResult<Product> {
        Product::new(
            Sku::parse("abc-1").unwrap(),
            Name::parse("Widget").unwrap(),
            Description::parse("A widget").unwrap(),
            Money::new(Decimal::new(1999, 2), "usd").unwrap(),
            category,
        )
    }

    #[test]
    fn test_new_product_in_active_category() {
        let product = product(Some(&category(4, true))).unwrap();
        assert_eq!(product.category_id(), Some(4));
        assert_eq!(product.sku().as_str(), "ABC-1");
        assert!(product.is_active());
    }

    #[test]
    fn test_inactive_category_rejected() {
        let err = product(Some(&category(4, false))).unwrap_err();
        assert!(matches!(err, CatalogError::InactiveCategory(4)));
    }

    #[test]
    fn test_set_category_to_uncategorized() {
        let mut product = product(Some(&category(4, true))).unwrap();
        product.set_category(None).unwrap();
        assert_eq!(product.category_id(), None);
        assert!(product.updated_at().is_some());

        assert!(product.set_category(Some(&category(5, false))).is_err());
    }
}
