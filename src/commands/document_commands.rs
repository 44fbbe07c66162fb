use std::path::Path;

use anyhow::bail;

use crate::services::api::FileAttachment;
use crate::services::documents::{DocumentPage, DocumentQuery, paginate};
use crate::services::search::{FetchState, SearchPage, section_preview};
use crate::services::upload::{UploadStatus, UploadStep, UploadWizard};

use super::AppContext;

pub async fn run_search(ctx: &AppContext, query: &str, full: bool) -> anyhow::Result<()> {
    let mut page = SearchPage::default();
    match page.fetch(&ctx.client, query).await {
        FetchState::Uninitialized => bail!("Enter a search query"),
        FetchState::Loading { .. } => bail!("Search did not complete"),
        FetchState::Error { message, .. } => bail!("Search failed: {message}"),
        FetchState::Loaded(items) if items.is_empty() => {
            println!("No results for \"{}\".", query.trim());
        }
        FetchState::Loaded(items) => {
            println!("{} result(s) for \"{}\":", items.len(), query.trim());
            for (i, item) in items.iter().enumerate() {
                let section = match &item.section_id {
                    Some(id) => format!(" (section {id})"),
                    None => String::new(),
                };
                println!("\n{}. [{}] {}{}", i + 1, item.doc_id, item.title, section);
                if full {
                    println!("   {}", item.section);
                } else {
                    println!("   {}", section_preview(&item.section));
                }
                if !item.html.is_empty() {
                    println!("   html: {}", ctx.client.resolve_link(&item.html));
                }
                if !item.pdf.is_empty() {
                    println!("   pdf:  {}", ctx.client.resolve_link(&item.pdf));
                }
            }
        }
    }
    Ok(())
}

/// One-line stepper, e.g. `[x] Select File > [x] Review > [ ] Upload > [ ] Complete`.
pub(crate) fn render_steps(current: UploadStep) -> String {
    UploadStep::ALL
        .iter()
        .map(|step| {
            let mark = if step.index() <= current.index() { 'x' } else { ' ' };
            format!("[{mark}] {}", step.label())
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

pub async fn run_upload(ctx: &AppContext, path: &Path) -> anyhow::Result<()> {
    let file = FileAttachment::from_path(path).await?;
    let mut wizard = UploadWizard::default();
    println!("{}", render_steps(wizard.step()));
    if let Err(err) = wizard.select(file) {
        bail!("{}", err.message());
    }

    println!("{}", render_steps(wizard.step()));
    if let Some(file) = wizard.file() {
        println!("Uploading {} ({} bytes)...", file.name, file.size());
    }
    let status = wizard.upload(&ctx.client).await;
    println!("{}", render_steps(wizard.step()));
    match status {
        UploadStatus::Success => {
            let request = wizard
                .receipt()
                .map(|r| r.request_id.as_str())
                .unwrap_or("unknown");
            println!("Upload complete. Request id: {request}");
            Ok(())
        }
        status => bail!("Upload did not complete (status: {status:?})"),
    }
}

pub(crate) fn render_page(page: &DocumentPage) -> String {
    let mut out = format!(
        "{} indexed, {} not indexed. Showing page {} of {} ({} matching).",
        page.indexed,
        page.not_indexed,
        page.page + 1,
        page.page_count,
        page.total_matching
    );
    for doc in &page.rows {
        let status = if doc.is_indexed { "indexed" } else { "pending" };
        out.push_str(&format!(
            "\n  {:<12} {:<8} {:<12} {}",
            doc.indexid, status, doc.username, doc.filepath
        ));
    }
    out
}

pub async fn run_docs(ctx: &AppContext, query: &DocumentQuery) -> anyhow::Result<()> {
    let docs = ctx.client.saved_docs().await?;
    println!("{}", render_page(&paginate(&docs, query)));
    Ok(())
}
