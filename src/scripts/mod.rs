//! The storefront's page scripts.
//!
//! Each module wires one script's listeners into a [`Page`] and holds the
//! behavior those listeners run. Listeners are stored as [`Handler`]
//! values so the page can compare, trace and dispatch them.

use std::fmt;

use crate::dom::NodeId;
use crate::page::{EventState, Page};
use crate::Result;

pub mod cart;
pub mod cart_ajax;
pub mod password;
pub mod product_filters;
pub mod register;
pub mod reviews;

/// A storefront script file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Cart,
    CartAjax,
    Login,
    Register,
    ProductFilters,
    Reviews,
}

impl Script {
    pub const ALL: [Script; 6] = [
        Script::Cart,
        Script::CartAjax,
        Script::Login,
        Script::Register,
        Script::ProductFilters,
        Script::Reviews,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Cart => "cart.js",
            Self::CartAjax => "cart_ajax.js",
            Self::Login => "login.js",
            Self::Register => "register.js",
            Self::ProductFilters => "product_filters.js",
            Self::Reviews => "reviews.js",
        }
    }

    /// Resolves a `<script src>` value such as
    /// `/static/js/product_filters.js?v=3` to the script it loads.
    pub fn from_src(src: &str) -> Option<Self> {
        let path = src.split(['?', '#']).next().unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|script| script.file_name() == file)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Handler {
    /// `DOMContentLoaded` setup of a script.
    Boot(Script),
    SyncFilters,
    ChangeQty { delta: i64 },
    AddToCart { product_id: String },
    TogglePassword { input: NodeId, toggle: NodeId },
    UpdateKindFields,
    ToggleReviewForm { button: NodeId, form_box: NodeId },
}

impl Handler {
    pub(crate) fn label(&self) -> String {
        match self {
            Self::Boot(script) => format!("boot({script})"),
            Self::SyncFilters => "sync_filters".into(),
            Self::ChangeQty { delta } => format!("change_qty({delta})"),
            Self::AddToCart { product_id } => format!("add_to_cart({product_id})"),
            Self::TogglePassword { .. } => "toggle_password".into(),
            Self::UpdateKindFields => "update_kind_fields".into(),
            Self::ToggleReviewForm { .. } => "toggle_review_form".into(),
        }
    }
}

pub(crate) fn install(page: &mut Page, script: Script) -> Result<()> {
    match script {
        Script::Cart => cart::install(page),
        Script::CartAjax => cart_ajax::install(page),
        Script::Login | Script::Register | Script::ProductFilters | Script::Reviews => {
            let root = page.dom.root;
            page.add_listener(root, "DOMContentLoaded", Handler::Boot(script));
            Ok(())
        }
    }
}

pub(crate) fn run_handler(page: &mut Page, handler: &Handler, event: &EventState) -> Result<()> {
    match handler {
        Handler::Boot(Script::Login) => password::boot_login(page),
        Handler::Boot(Script::Register) => register::boot(page),
        Handler::Boot(Script::ProductFilters) => product_filters::boot(page),
        Handler::Boot(Script::Reviews) => reviews::boot(page),
        Handler::Boot(Script::Cart | Script::CartAjax) => Ok(()),
        Handler::SyncFilters => product_filters::update_filter_controls(page).map(|_| ()),
        Handler::ChangeQty { delta } => cart::change_qty_at(page, event.current_target, *delta),
        Handler::AddToCart { product_id } => cart_ajax::add_to_cart_with_page_endpoint(page, product_id),
        Handler::TogglePassword { input, toggle } => password::toggle(page, *input, *toggle),
        Handler::UpdateKindFields => register::update_kind_fields(page),
        Handler::ToggleReviewForm { button, form_box } => {
            reviews::toggle(page, *button, *form_box)
        }
    }
}
