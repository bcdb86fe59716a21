//! "Add to cart" without a page reload.
//!
//! Product cards carry `data-add-to-cart="<product id>"`. A click posts to
//! `/add-to-cart/<id>` and, when the response reports a new `cart_total`,
//! refreshes `#cart-total`. Failures are logged to the console and
//! otherwise ignored.

use serde_json::Value;

use crate::Result;
use crate::page::Page;
use crate::scripts::Handler;

pub(crate) const ADD_TO_CART_ATTR: &str = "data-add-to-cart";
const CART_TOTAL_ID: &str = "cart-total";

/// What the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: String,
}

impl EndpointResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network seam for add-to-cart requests. `Err` stands for a transport
/// failure (the request never produced a response).
pub trait CartEndpoint {
    fn post(&mut self, path: &str) -> std::result::Result<EndpointResponse, String>;
}

impl<F> CartEndpoint for F
where
    F: FnMut(&str) -> std::result::Result<EndpointResponse, String>,
{
    fn post(&mut self, path: &str) -> std::result::Result<EndpointResponse, String> {
        self(path)
    }
}

pub(crate) fn install(page: &mut Page) -> Result<()> {
    let buttons = page
        .dom
        .query_selector_all(&format!("[{ADD_TO_CART_ATTR}]"))?;
    for button in buttons {
        let product_id = page.dom.attr(button, ADD_TO_CART_ATTR).unwrap_or_default();
        page.add_listener(button, "click", Handler::AddToCart { product_id });
    }
    Ok(())
}

pub(crate) fn add_to_cart_with_page_endpoint(page: &mut Page, product_id: &str) -> Result<()> {
    let Some(mut endpoint) = page.take_cart_endpoint() else {
        page.console_log("AJAX error: no cart endpoint configured");
        return Ok(());
    };
    let result = add_to_cart(page, endpoint.as_mut(), product_id);
    page.restore_cart_endpoint(endpoint);
    result
}

/// Posts the product to the cart and refreshes the displayed total.
pub fn add_to_cart(
    page: &mut Page,
    endpoint: &mut dyn CartEndpoint,
    product_id: &str,
) -> Result<()> {
    let path = format!("/add-to-cart/{product_id}");
    page.trace_script_line(format!("[cart] POST {path}"));

    let response = match endpoint.post(&path) {
        Ok(response) => response,
        Err(err) => {
            page.console_log(format!("AJAX error: {err}"));
            return Ok(());
        }
    };

    if !response.is_ok() {
        page.console_log("Error adding to cart");
        return Ok(());
    }

    let data = match serde_json::from_str::<Value>(&response.body) {
        Ok(data) => data,
        Err(err) => {
            page.console_log(format!("AJAX error: {err}"));
            return Ok(());
        }
    };

    let total = match &data {
        Value::Object(fields) => match fields.get("cart_total") {
            None => return Ok(()),
            Some(Value::Number(total)) => total.as_f64(),
            Some(other) => {
                page.console_log(format!("AJAX error: cart_total is not a number: {other}"));
                return Ok(());
            }
        },
        Value::Null => {
            page.console_log("AJAX error: response body is null");
            return Ok(());
        }
        _ => return Ok(()),
    };

    let Some(total) = total else {
        return Ok(());
    };
    if let Some(el) = page.dom.by_id(CART_TOTAL_ID) {
        page.dom.set_text_content(el, &format_cart_total(total))?;
    }
    Ok(())
}

/// Two decimals and a euro sign, e.g. `12.50 €`. Rounds like
/// `Number.prototype.toFixed(2)`.
pub fn format_cart_total(total: f64) -> String {
    format!("{} €", to_fixed(total, 2))
}

// Longest exact decimal expansion of an f64 needs 1074 fraction digits.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// `toFixed` over the exact binary value: a discarded part of one half or
/// more rounds away from zero, so exact ties like `0.125` give `0.13`.
fn to_fixed(value: f64, fraction_digits: usize) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (int_part, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut digits = int_part
        .chars()
        .chain(fraction.chars().chain(std::iter::repeat('0')).take(fraction_digits))
        .collect::<Vec<_>>();
    let round_up = fraction
        .chars()
        .nth(fraction_digits)
        .is_some_and(|digit| digit >= '5');

    if round_up {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == '9' {
                *digit = '0';
            } else {
                *digit = char::from(*digit as u8 + 1);
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, '1');
        }
    }

    let int_len = digits.len() - fraction_digits;
    let int_digits = digits[..int_len].iter().collect::<String>();
    if fraction_digits == 0 {
        return format!("{sign}{int_digits}");
    }
    let fraction_digits = digits[int_len..].iter().collect::<String>();
    format!("{sign}{int_digits}.{fraction_digits}")
}
