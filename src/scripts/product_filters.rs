use crate::Result;
use crate::filters::{FilterControls, SyncOutcome, sync_filter_controls};
use crate::page::Page;
use crate::scripts::Handler;

/// `DOMContentLoaded`: listen for `change` on whichever filter selects the
/// page carries, then bring them in line once.
pub(crate) fn boot(page: &mut Page) -> Result<()> {
    for control in FilterControls::present(&page.dom)? {
        page.add_listener(control, "change", Handler::SyncFilters);
    }
    update_filter_controls(page)?;
    Ok(())
}

/// Runs one synchronization pass over the page's filter selects.
///
/// A page without all four selects is left untouched and reports
/// [`SyncOutcome::Skipped`].
pub fn update_filter_controls(page: &mut Page) -> Result<SyncOutcome> {
    let outcome = sync_filter_controls(&mut page.dom)?;
    let line = match &outcome {
        SyncOutcome::Applied(applied) => {
            let category = applied
                .state
                .category
                .map(|category| category.as_value())
                .unwrap_or("");
            let disabled = applied
                .disabled
                .iter()
                .map(|field| field.name())
                .collect::<Vec<_>>()
                .join(",");
            format!("[filters] category={category:?} disabled=[{disabled}]")
        }
        SyncOutcome::Unmapped { category } => {
            format!("[filters] category={category:?} has no rule; all attributes enabled")
        }
        SyncOutcome::Skipped(missing) => format!("[filters] skipped: missing {missing}"),
    };
    page.trace_script_line(line);
    Ok(outcome)
}
