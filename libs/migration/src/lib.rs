pub use sea_orm_migration::prelude::*;

mod m20250310_000000_create_roles_and_users;
mod m20250310_000001_create_categories;
mod m20250310_000002_create_products;
mod m20250310_000003_create_product_images;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250310_000000_create_roles_and_users::Migration),
            Box::new(m20250310_000001_create_categories::Migration),
            Box::new(m20250310_000002_create_products::Migration),
            Box::new(m20250310_000003_create_product_images::Migration),
        ]
    }
}
