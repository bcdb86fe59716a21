//! Quantity buttons on the cart page.
//!
//! Every cart line is a small form with a `qty` input and a pair of
//! buttons carrying `data-qty-delta="-1"` / `data-qty-delta="1"`. A click
//! adjusts the quantity and submits the form right away.

use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::dom::NodeId;
use crate::page::Page;
use crate::scripts::Handler;
use crate::{Error, Result};

pub(crate) const QTY_DELTA_ATTR: &str = "data-qty-delta";
const QTY_INPUT_SELECTOR: &str = "input[name=\"qty\"]";

static INT_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?)([0-9]+)").ok());

pub(crate) fn install(page: &mut Page) -> Result<()> {
    let buttons = page.dom.query_selector_all(&format!("[{QTY_DELTA_ATTR}]"))?;
    for button in buttons {
        let raw = page.dom.attr(button, QTY_DELTA_ATTR).unwrap_or_default();
        match raw.trim().parse::<i64>() {
            Ok(delta) => page.add_listener(button, "click", Handler::ChangeQty { delta }),
            Err(_) => {
                let label = page.dom.node_label(button);
                page.console_log(format!("ignoring {label}: bad {QTY_DELTA_ATTR} {raw:?}"));
            }
        }
    }
    Ok(())
}

/// Adjusts the quantity of the form containing `button_selector` by
/// `delta` and submits that form.
pub fn change_qty(page: &mut Page, button_selector: &str, delta: i64) -> Result<()> {
    let button = page.select_one(button_selector)?;
    change_qty_at(page, button, delta)
}

pub(crate) fn change_qty_at(page: &mut Page, button: NodeId, delta: i64) -> Result<()> {
    let Some(form) = page.dom.closest(button, "form")? else {
        return Ok(());
    };
    let Some(input) = page.dom.query_selector_from(form, QTY_INPUT_SELECTOR)? else {
        return Ok(());
    };

    let current = page.dom.value(input)?;
    let raw = if current.is_empty() { "0" } else { current.as_str() };
    let value = parse_int_prefix(raw)?
        .unwrap_or(0)
        .saturating_add(delta)
        .max(0);

    page.dom.set_value(input, &value.to_string())?;
    page.trace_script_line(format!("[cart] qty {current:?} -> {value}"));
    page.submit_form(form)
}

/// `parseInt(raw, 10)`: leading whitespace, an optional sign, then the
/// longest run of digits. `None` when no digits follow. Out-of-range values
/// saturate.
pub fn parse_int_prefix(raw: &str) -> Result<Option<i64>> {
    let regex = INT_PREFIX
        .as_ref()
        .ok_or_else(|| Error::Pattern("integer prefix pattern failed to compile".into()))?;
    let captures = regex
        .captures(raw)
        .map_err(|err| Error::Pattern(format!("integer prefix match: {err}")))?;
    let Some(captures) = captures else {
        return Ok(None);
    };

    let negative = captures.get(1).is_some_and(|sign| sign.as_str() == "-");
    let digits = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let mut value: i64 = 0;
    for digit in digits.bytes() {
        let digit = i64::from(digit - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    Ok(Some(value))
}
