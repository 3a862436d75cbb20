//! Read-only reference data queries.

use clap::Subcommand;
use tact_core::{AppConfig, Category};
use tact_store::{ReferenceStore, RestStore};

/// Sub-commands available under `catalog`.
#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// List active images for a wizard step in display order
    Images {
        /// shape, design or material
        category: Category,
    },
    /// List governorates offered on the contact step
    Governorates,
}

/// Dispatch a `catalog` sub-command.
///
/// # Errors
///
/// Returns an error if the store client cannot be built or the query fails.
pub(crate) async fn run(config: &AppConfig, command: CatalogCommands) -> anyhow::Result<()> {
    let store = RestStore::new(&config.store)
        .map_err(|e| anyhow::anyhow!("failed to build store client: {e}"))?;
    match command {
        CatalogCommands::Images { category } => run_catalog_images(&store, category).await,
        CatalogCommands::Governorates => run_catalog_governorates(&store).await,
    }
}

async fn run_catalog_images(store: &dyn ReferenceStore, category: Category) -> anyhow::Result<()> {
    let images = store.list_active(category).await?;
    if images.is_empty() {
        println!("no active {category} images");
        return Ok(());
    }

    println!("{:<7}{:<38}{:<28}URL", "ORDER", "ID", "TITLE");
    for image in &images {
        let title = image.title.as_deref().unwrap_or("-");
        let title_display = if title.chars().count() > 25 {
            format!("{}...", title.chars().take(25).collect::<String>())
        } else {
            title.to_owned()
        };
        println!(
            "{:<7}{:<38}{:<28}{}",
            image.display_order, image.id, title_display, image.image_url
        );
    }
    Ok(())
}

async fn run_catalog_governorates(store: &dyn ReferenceStore) -> anyhow::Result<()> {
    let governorates = store.list_governorates().await?;
    if governorates.is_empty() {
        println!("no governorates found");
        return Ok(());
    }

    println!("{:<38}NAME", "ID");
    for governorate in &governorates {
        println!("{:<38}{}", governorate.id, governorate.name_ar);
    }
    Ok(())
}
