use crate::Result;
use crate::dom::NodeId;
use crate::page::Page;
use crate::scripts::Handler;

pub const HIDDEN_CLASS: &str = "hidden";
pub const LABEL_WHEN_HIDDEN: &str = "Write a review";
pub const LABEL_WHEN_SHOWN: &str = "Hide form";

pub(crate) fn boot(page: &mut Page) -> Result<()> {
    let (Some(button), Some(form_box)) = (
        page.dom.by_id("toggleReviewBtn"),
        page.dom.by_id("reviewFormBox"),
    ) else {
        page.console_log("No review toggle or form box found");
        return Ok(());
    };

    page.add_listener(button, "click", Handler::ToggleReviewForm { button, form_box });
    Ok(())
}

pub(crate) fn toggle(page: &mut Page, button: NodeId, form_box: NodeId) -> Result<()> {
    let hidden = page.dom.class_toggle(form_box, HIDDEN_CLASS)?;
    let label = if hidden {
        LABEL_WHEN_HIDDEN
    } else {
        LABEL_WHEN_SHOWN
    };
    page.dom.set_text_content(button, label)?;
    Ok(())
}
