use chrono::{DateTime, Utc};
use domain_kernel::{Description, Name};

use crate::error::{CatalogError, CatalogResult};

/// Product category. Categories form a tree at most one level deep.
#[derive(Debug, Clone)]
pub struct Category {
    pub(crate) id: Option<i32>,
    pub(crate) name: Name,
    pub(crate) description: Description,
    pub(crate) is_active: bool,
    pub(crate) parent_id: Option<i32>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl Category {
    /// A new active category, optionally nested under `parent`.
    pub fn new(
        name: Name,
        description: Description,
        parent: Option<&Category>,
    ) -> CatalogResult<Self> {
        let mut category = Self {
            id: None,
            name,
            description,
            is_active: true,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        if let Some(parent) = parent {
            category.parent_id = Some(Self::check_parent(None, parent)?);
        }
        Ok(category)
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn parent_id(&self) -> Option<i32> {
        self.parent_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn update_details(&mut self, name: Name, description: Description, is_active: bool) {
        self.name = name;
        self.description = description;
        self.is_active = is_active;
        self.touch();
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Move under `parent`, or to the top level with `None`.
    ///
    /// The parent must be a saved top-level category other than this one.
    pub fn set_parent(&mut self, parent: Option<&Category>) -> CatalogResult<()> {
        self.parent_id = match parent {
            Some(parent) => Some(Self::check_parent(self.id, parent)?),
            None => None,
        };
        self.touch();
        Ok(())
    }

    fn check_parent(own_id: Option<i32>, parent: &Category) -> CatalogResult<i32> {
        let parent_id = parent.id.ok_or_else(|| {
            CatalogError::validation("parent_category_id", "Parent category must be saved first")
        })?;
        if own_id == Some(parent_id) {
            return Err(CatalogError::validation(
                "parent_category_id",
                "A category cannot be its own parent",
            ));
        }
        if parent.parent_id.is_some() {
            return Err(CatalogError::validation(
                "parent_category_id",
                "Subcategories cannot have subcategories",
            ));
        }
        Ok(parent_id)
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        super::same_identity(self.id, other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_kernel::ErrorKind;

    fn saved(id: i32, name: &str) -> Category {
        let mut category =
            Category::new(Name::parse(name).unwrap(), Description::empty(), None).unwrap();
        category.id = Some(id);
        category
    }

    #[test]
    fn test_new_category_is_active_top_level() {
        let category = saved(1, "Tools");
        assert!(category.is_active());
        assert_eq!(category.parent_id(), None);
        assert!(category.updated_at().is_none());
    }

    #[test]
    fn test_one_level_of_nesting() {
        let root = saved(1, "Tools");
        let mut child = saved(2, "Hammers");
        child.set_parent(Some(&root)).unwrap();
        assert_eq!(child.parent_id(), Some(1));

        let err = Category::new(Name::parse("Claw").unwrap(), Description::empty(), Some(&child))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Subcategories cannot have subcategories");
    }

    #[test]
    fn test_cannot_parent_itself_or_unsaved() {
        let mut root = saved(1, "Tools");
        let same = root.clone();
        assert!(root.set_parent(Some(&same)).is_err());

        let unsaved = Category::new(Name::parse("Draft").unwrap(), Description::empty(), None)
            .unwrap();
        assert!(root.set_parent(Some(&unsaved)).is_err());

        root.set_parent(None).unwrap();
        assert_eq!(root.parent_id(), None);
    }

    #[test]
    fn test_deactivate_stamps_updated_at() {
        let mut category = saved(1, "Tools");
        category.deactivate();
        assert!(!category.is_active());
        assert!(category.updated_at().is_some());
    }
}
