//! Site content commands.

use std::collections::HashSet;

use klyp_core::SectionName;
use klyp_core::sections::SectionContent;
use klyp_web::db::{ContentRepository, PgContentRepository};

use super::{CliError, connect};

/// Store the default copy for every known section.
///
/// Sections that already have a document are skipped unless `force` is set,
/// so edits made in the console survive a re-seed.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn seed(force: bool) -> Result<(), CliError> {
    let repo = PgContentRepository::new(connect().await?);

    let existing: HashSet<String> = repo
        .list()
        .await?
        .into_iter()
        .map(|doc| doc.section.as_str().to_owned())
        .collect();

    let (mut written, mut skipped) = (0_usize, 0_usize);
    for defaults in SectionContent::defaults() {
        if !force && existing.contains(defaults.section()) {
            tracing::info!(section = defaults.section(), "Skipping existing section");
            skipped += 1;
            continue;
        }
        let section = SectionName::parse(defaults.section())?;
        repo.upsert(&section, &defaults.to_content()).await?;
        tracing::info!(%section, "Seeded section");
        written += 1;
    }

    tracing::info!(written, skipped, "Content seed complete");
    Ok(())
}
