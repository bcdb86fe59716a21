use crate::Result;
use crate::dom::NodeId;
use crate::page::Page;
use crate::scripts::Handler;

pub const ICON_VISIBLE: &str = "🙈";
pub const ICON_HIDDEN: &str = "👁️";

/// Login page: `#password` with a `#togglePassword` eye.
pub(crate) fn boot_login(page: &mut Page) -> Result<()> {
    page.console_log("login.js loaded");

    let (Some(input), Some(toggle)) = (page.dom.by_id("password"), page.dom.by_id("togglePassword"))
    else {
        page.console_log("No password or toggle element found");
        return Ok(());
    };

    page.add_listener(toggle, "click", Handler::TogglePassword { input, toggle });
    Ok(())
}

/// Registration page: `.password-eye[data-target="<id>"]` next to the input
/// with that id. Missing pairs are skipped.
pub(crate) fn setup_eye(page: &mut Page, input_id: &str) -> Result<()> {
    let Some(input) = page.dom.by_id(input_id) else {
        return Ok(());
    };
    let selector = format!(".password-eye[data-target=\"{input_id}\"]");
    let Some(toggle) = page.dom.query_selector(&selector)? else {
        return Ok(());
    };

    page.add_listener(toggle, "click", Handler::TogglePassword { input, toggle });
    Ok(())
}

/// Flips the input between `password` and `text` and swaps the eye icon.
pub(crate) fn toggle(page: &mut Page, input: NodeId, toggle: NodeId) -> Result<()> {
    let masked = page
        .dom
        .attr(input, "type")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("password"));

    if masked {
        page.dom.set_attr(input, "type", "text")?;
        page.dom.set_text_content(toggle, ICON_VISIBLE)?;
    } else {
        page.dom.set_attr(input, "type", "password")?;
        page.dom.set_text_content(toggle, ICON_HIDDEN)?;
    }
    Ok(())
}
