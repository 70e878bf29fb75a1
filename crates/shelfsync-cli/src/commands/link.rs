use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use shelf_sync_core::canonical_link;
use shelf_sync_sources::weread::WEREAD_READER_BASE;
use shelf_sync_sources::LinkScheme;

pub fn run_link(id: &str, output: &Output) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(eyre!("Book id must not be empty"));
    }
    let scheme = LinkScheme::ReaderToken {
        base: WEREAD_READER_BASE.to_string(),
    };
    let link = canonical_link(&scheme, id);

    if output.is_human() {
        output.info(&link);
    } else {
        output.json(&json!({ "id": id, "link": link }));
    }
    Ok(())
}
