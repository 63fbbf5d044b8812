use domain_kernel::{Description, Name, PageRequest, PagedResult};
use std::sync::Arc;
use tracing::instrument;

use super::require_id;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Category, CategoryDto, CategoryFilter, CategorySummary, CreateCategory, UpdateCategory,
};
use crate::repository::{
    normalize_term, CatalogUnitOfWork, CategoryQuery, CategoryRepository, ProductRepository,
};

/// Service layer for Category business logic
#[derive(Clone)]
pub struct CategoryService<U: CatalogUnitOfWork> {
    uow: Arc<U>,
}

impl<U: CatalogUnitOfWork> CategoryService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow: Arc::new(uow) }
    }

    #[instrument(skip(self, input), fields(category_name = %input.name))]
    pub async fn create_category(&self, input: CreateCategory) -> CatalogResult<CategoryDto> {
        let name = Name::parse(&input.name)?;
        let description = Description::parse(&input.description)?;

        if self.uow.categories().name_exists(&name, None).await? {
            return Err(CatalogError::DuplicateCategoryName(name.into_inner()));
        }

        let parent = match input.parent_category_id {
            Some(parent_id) => Some(self.find(parent_id).await?),
            None => None,
        };
        let category = Category::new(name, description, parent.as_ref())?;

        let category = self.uow.categories().add(category).await?;
        Ok(CategoryDto::new(&category, 0))
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: i32,
        input: UpdateCategory,
    ) -> CatalogResult<CategoryDto> {
        require_id("category_id", id)?;
        let name = Name::parse(&input.name)?;
        let description = Description::parse(&input.description)?;
        let mut category = self.find(id).await?;

        if self.uow.categories().name_exists(&name, Some(id)).await? {
            return Err(CatalogError::DuplicateCategoryName(name.into_inner()));
        }

        category.update_details(name, description, input.is_active);
        let category = self.uow.categories().update(category).await?;
        let products = self.uow.products().count_by_category(id).await?;
        Ok(CategoryDto::new(&category, products))
    }

    /// Move a category under `parent_id`, or to the top level with `None`.
    ///
    /// Categories nest one level deep, so a category that has subcategories
    /// cannot itself be moved under another.
    #[instrument(skip(self))]
    pub async fn move_category(
        &self,
        id: i32,
        parent_id: Option<i32>,
    ) -> CatalogResult<CategoryDto> {
        require_id("category_id", id)?;
        let mut category = self.find(id).await?;

        let parent = match parent_id {
            Some(parent_id) => Some(self.find(parent_id).await?),
            None => None,
        };
        if parent.is_some() && self.uow.categories().has_children(id).await? {
            return Err(CatalogError::validation(
                "parent_category_id",
                "Subcategories cannot have subcategories",
            ));
        }

        category.set_parent(parent.as_ref())?;
        let category = self.uow.categories().update(category).await?;
        let products = self.uow.products().count_by_category(id).await?;
        Ok(CategoryDto::new(&category, products))
    }

    /// Fails with a conflict while products or subcategories reference it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        require_id("category_id", id)?;
        self.find(id).await?;

        let products = self.uow.products().count_by_category(id).await?;
        if products > 0 {
            return Err(CatalogError::CategoryHasProducts {
                category_id: id,
                products,
            });
        }
        if self.uow.categories().has_children(id).await? {
            return Err(CatalogError::CategoryHasSubcategories(id));
        }

        if !self.uow.categories().remove(id).await? {
            return Err(CatalogError::CategoryNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i32) -> CatalogResult<CategoryDto> {
        require_id("category_id", id)?;
        let category = self.find(id).await?;
        let products = self.uow.products().count_by_category(id).await?;
        Ok(CategoryDto::new(&category, products))
    }

    /// One page ordered by name. Product counts are only filled in when
    /// `include_product_count` is set, from one grouped query.
    #[instrument(skip(self, filter))]
    pub async fn list_categories(
        &self,
        filter: CategoryFilter,
    ) -> CatalogResult<PagedResult<CategoryDto>> {
        let page = PageRequest::new(filter.page, filter.page_size)?;
        let query = CategoryQuery {
            is_active: filter.is_active,
            search_term: normalize_term(filter.search_term.as_deref()),
        };

        let total = self.uow.categories().count(&query).await?;
        let categories = self.uow.categories().list_page(&query, &page).await?;

        let counts = if filter.include_product_count {
            let ids: Vec<i32> = categories.iter().filter_map(Category::id).collect();
            self.uow.products().count_by_categories(&ids).await?
        } else {
            Default::default()
        };

        let items = categories
            .iter()
            .map(|c| {
                let products = c.id().and_then(|id| counts.get(&id).copied()).unwrap_or(0);
                CategoryDto::new(c, products)
            })
            .collect();
        Ok(PagedResult::new(items, total, page))
    }

    /// Active categories ordered by name, with product counts
    #[instrument(skip(self))]
    pub async fn list_active_categories(&self) -> CatalogResult<Vec<CategorySummary>> {
        let categories = self.uow.categories().list_active().await?;
        let ids: Vec<i32> = categories.iter().filter_map(Category::id).collect();
        let counts = self.uow.products().count_by_categories(&ids).await?;

        Ok(categories
            .iter()
            .map(|c| {
                let products = c.id().and_then(|id| counts.get(&id).copied()).unwrap_or(0);
                CategorySummary::new(c, products)
            })
            .collect())
    }

    async fn find(&self, id: i32) -> CatalogResult<Category> {
        self.uow
            .categories()
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::repository::InMemoryCatalogUnitOfWork;
    use domain_kernel::{Decimal, ErrorKind, Money, Sku};

    fn create(name: &str, parent: Option<i32>) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            description: String::new(),
            parent_category_id: parent,
        }
    }

    fn update(name: &str, is_active: bool) -> UpdateCategory {
        UpdateCategory {
            name: name.to_string(),
            description: "Updated".to_string(),
            is_active,
        }
    }

    async fn add_product(uow: &InMemoryCatalogUnitOfWork, sku: &str, category_id: i32) {
        let category = uow.categories().get_by_id(category_id).await.unwrap().unwrap();
        let product = Product::new(
            Sku::parse(sku).unwrap(),
            Name::parse("Hammer").unwrap(),
            Description::empty(),
            Money::new(Decimal::new(1500, 2), "USD").unwrap(),
            Some(&category),
        )
        .unwrap();
        uow.products().add(product).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_category() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let dto = service.create_category(create("  Tools ", None)).await.unwrap();

        assert_eq!(dto.name, "Tools");
        assert!(dto.is_active);
        assert_eq!(dto.product_count, 0);
        assert_eq!(dto.parent_category_id, None);
    }

    #[tokio::test]
    async fn test_create_blank_name_is_validation() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let err = service.create_category(create("  ", None)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Name is required");
    }

    #[tokio::test]
    async fn test_create_duplicate_name_ignores_case() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        service.create_category(create("Tools", None)).await.unwrap();

        let err = service.create_category(create("TOOLS", None)).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCategoryName(ref n) if n == "TOOLS"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_create_with_missing_parent() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let err = service
            .create_category(create("Drills", Some(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(42)));
    }

    #[tokio::test]
    async fn test_create_under_subcategory_rejected() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let tools = service.create_category(create("Tools", None)).await.unwrap();
        let power = service
            .create_category(create("Power Tools", Some(tools.id)))
            .await
            .unwrap();
        assert_eq!(power.parent_category_id, Some(tools.id));

        let err = service
            .create_category(create("Drills", Some(power.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_update_rename_to_other_category_conflicts() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        service.create_category(create("Tools", None)).await.unwrap();
        let garden = service.create_category(create("Garden", None)).await.unwrap();

        let err = service
            .update_category(garden.id, update("tools", true))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let renamed = service
            .update_category(garden.id, update("garden", false))
            .await
            .unwrap();
        assert_eq!(renamed.name, "garden");
        assert!(!renamed.is_active);
    }

    #[tokio::test]
    async fn test_update_invalid_id_before_lookup() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let err = service.update_category(0, update("Tools", true)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service.update_category(5, update("Tools", true)).await.unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(5)));
    }

    #[tokio::test]
    async fn test_delete_category_with_products_conflicts() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = CategoryService::new(uow.clone());
        let tools = service.create_category(create("Tools", None)).await.unwrap();
        add_product(&uow, "HAM-1", tools.id).await;

        let err = service.delete_category(tools.id).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::CategoryHasProducts { products: 1, .. }
        ));
        assert!(service.get_category(tools.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_category_with_subcategories_conflicts() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let tools = service.create_category(create("Tools", None)).await.unwrap();
        service
            .create_category(create("Power Tools", Some(tools.id)))
            .await
            .unwrap();

        let err = service.delete_category(tools.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::CategoryHasSubcategories(_)));
    }

    #[tokio::test]
    async fn test_delete_category() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let tools = service.create_category(create("Tools", None)).await.unwrap();

        service.delete_category(tools.id).await.unwrap();

        let err = service.get_category(tools.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            service.delete_category(-1).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[tokio::test]
    async fn test_move_category_with_children_rejected() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let tools = service.create_category(create("Tools", None)).await.unwrap();
        let garden = service.create_category(create("Garden", None)).await.unwrap();
        service
            .create_category(create("Power Tools", Some(tools.id)))
            .await
            .unwrap();

        let err = service
            .move_category(tools.id, Some(garden.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let moved = service.move_category(garden.id, Some(tools.id)).await.unwrap();
        assert_eq!(moved.parent_category_id, Some(tools.id));
        let top = service.move_category(garden.id, None).await.unwrap();
        assert_eq!(top.parent_category_id, None);
    }

    #[tokio::test]
    async fn test_list_categories_filters_and_counts() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = CategoryService::new(uow.clone());
        let tools = service.create_category(create("Tools", None)).await.unwrap();
        service.create_category(create("Garden", None)).await.unwrap();
        service.create_category(create("Toys", None)).await.unwrap();
        add_product(&uow, "HAM-1", tools.id).await;
        add_product(&uow, "HAM-2", tools.id).await;

        let page = service
            .list_categories(CategoryFilter {
                search_term: Some(" TO ".to_string()),
                include_product_count: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_count, 2);
        let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Tools", "Toys"]);
        assert_eq!(page.items[0].product_count, 2);
        assert_eq!(page.items[1].product_count, 0);
    }

    #[tokio::test]
    async fn test_list_categories_rejects_bad_page() {
        let service = CategoryService::new(InMemoryCatalogUnitOfWork::new());
        let err = service
            .list_categories(CategoryFilter {
                page_size: 101,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_active_categories() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = CategoryService::new(uow.clone());
        let tools = service.create_category(create("Tools", None)).await.unwrap();
        let garden = service.create_category(create("Garden", None)).await.unwrap();
        let archive = service.create_category(create("Archive", None)).await.unwrap();
        service
            .update_category(archive.id, update("Archive", false))
            .await
            .unwrap();
        add_product(&uow, "HAM-1", tools.id).await;

        let active = service.list_active_categories().await.unwrap();

        assert_eq!(
            active,
            vec![
                CategorySummary {
                    id: garden.id,
                    name: "Garden".to_string(),
                    is_active: true,
                    product_count: 0,
                },
                CategorySummary {
                    id: tools.id,
                    name: "Tools".to_string(),
                    is_active: true,
                    product_count: 1,
                },
            ]
        );
    }
}
