use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    // run_cli installs its own tracing subscriber
    core_config::tracing::install_color_eyre();
    cli::run_cli(Migrator).await;
}
