//! Category-dependent product filters.
//!
//! The product list page carries four `select` controls: `category`,
//! `brand`, `author` and `size`. Each category admits exactly one secondary
//! attribute (electronics → brand, books → author, clothing → size). After
//! every change the controls are brought back in line: attributes that do
//! not apply to the active category are cleared and disabled, and a
//! category left at "All categories" is inferred from whichever attribute
//! the user picked first.
//!
//! [`synchronize`] is the whole rule set as a pure function over
//! [`FilterState`]. A small adapter reads that state out of the page and
//! writes the result back.

use std::fmt;

use crate::dom::{Dom, NodeId};
use crate::Result;

/// Top-level product grouping gating which secondary attribute applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Electronics,
    Books,
    Clothing,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Electronics, Category::Books, Category::Clothing];

    /// Parses a category select value. Matching is exact; `""` and unknown
    /// values both yield `None`.
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "electronics" => Some(Self::Electronics),
            "books" => Some(Self::Books),
            "clothing" => Some(Self::Clothing),
            _ => None,
        }
    }

    pub fn as_value(self) -> &'static str {
        match self {
            Self::Electronics => "electronics",
            Self::Books => "books",
            Self::Clothing => "clothing",
        }
    }

    /// The single secondary attribute valid for this category.
    pub fn mapped_attribute(self) -> AttributeField {
        CategoryRule::for_category(self).allowed
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_value())
    }
}

/// Secondary filter controls, in inference priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeField {
    Brand,
    Author,
    Size,
}

impl AttributeField {
    pub const ALL: [AttributeField; 3] = [
        AttributeField::Brand,
        AttributeField::Author,
        AttributeField::Size,
    ];

    /// The control's `name` attribute.
    pub fn name(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Author => "author",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for AttributeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static category → allowed attribute mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub allowed: AttributeField,
}

pub const CATEGORY_RULES: [CategoryRule; 3] = [
    CategoryRule {
        category: Category::Electronics,
        allowed: AttributeField::Brand,
    },
    CategoryRule {
        category: Category::Books,
        allowed: AttributeField::Author,
    },
    CategoryRule {
        category: Category::Clothing,
        allowed: AttributeField::Size,
    },
];

impl CategoryRule {
    pub fn for_category(category: Category) -> &'static CategoryRule {
        match category {
            Category::Electronics => &CATEGORY_RULES[0],
            Category::Books => &CATEGORY_RULES[1],
            Category::Clothing => &CATEGORY_RULES[2],
        }
    }

    pub fn for_attribute(field: AttributeField) -> &'static CategoryRule {
        match field {
            AttributeField::Brand => &CATEGORY_RULES[0],
            AttributeField::Author => &CATEGORY_RULES[1],
            AttributeField::Size => &CATEGORY_RULES[2],
        }
    }

    /// The two attributes this rule clears and disables.
    pub fn excluded(&self) -> impl Iterator<Item = AttributeField> + '_ {
        AttributeField::ALL
            .into_iter()
            .filter(move |field| *field != self.allowed)
    }
}

/// Values of the four filter controls. Empty strings mean "nothing picked".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub category: Option<Category>,
    pub brand: String,
    pub author: String,
    pub size: String,
}

impl FilterState {
    pub fn new(category: Option<Category>) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    pub fn with(mut self, field: AttributeField, value: impl Into<String>) -> Self {
        *self.attribute_mut(field) = value.into();
        self
    }

    pub fn attribute(&self, field: AttributeField) -> &str {
        match field {
            AttributeField::Brand => &self.brand,
            AttributeField::Author => &self.author,
            AttributeField::Size => &self.size,
        }
    }

    pub fn attribute_mut(&mut self, field: AttributeField) -> &mut String {
        match field {
            AttributeField::Brand => &mut self.brand,
            AttributeField::Author => &mut self.author,
            AttributeField::Size => &mut self.size,
        }
    }
}

/// Result of [`synchronize`]: the new values plus the attribute controls
/// that must be disabled. Every attribute not listed is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub state: FilterState,
    pub disabled: Vec<AttributeField>,
}

impl FilterOutcome {
    pub fn is_disabled(&self, field: AttributeField) -> bool {
        self.disabled.contains(&field)
    }
}

/// Applies the category rules to `state`.
///
/// With a category set, the two attributes it does not map to are cleared
/// and disabled. Without one, the first non-empty attribute in
/// brand, author, size order decides the category and the same clearing
/// applies. With nothing picked all three stay enabled.
pub fn synchronize(state: &FilterState) -> FilterOutcome {
    let mut next = state.clone();

    let rule = match state.category {
        Some(category) => CategoryRule::for_category(category),
        None => {
            let Some(field) = AttributeField::ALL
                .into_iter()
                .find(|field| !state.attribute(*field).is_empty())
            else {
                return FilterOutcome {
                    state: next,
                    disabled: Vec::new(),
                };
            };
            let rule = CategoryRule::for_attribute(field);
            next.category = Some(rule.category);
            rule
        }
    };

    let disabled = rule.excluded().collect::<Vec<_>>();
    for field in &disabled {
        next.attribute_mut(*field).clear();
    }

    FilterOutcome {
        state: next,
        disabled,
    }
}

/// A filter control the page is expected to carry but does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingControl {
    Category,
    Attribute(AttributeField),
}

impl fmt::Display for MissingControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "select[name=\"category\"]"),
            Self::Attribute(field) => write!(f, "select[name=\"{}\"]", field.name()),
        }
    }
}

/// What a synchronization pass did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied(FilterOutcome),
    /// The category select holds a value no rule covers. Attributes were
    /// re-enabled and left as they were.
    Unmapped { category: String },
    Skipped(MissingControl),
}

pub(crate) const CATEGORY_SELECTOR: &str = "select[name=\"category\"]";

pub(crate) fn attribute_selector(field: AttributeField) -> String {
    format!("select[name=\"{}\"]", field.name())
}

/// The four filter selects as found in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FilterControls {
    category: NodeId,
    attributes: [NodeId; 3],
}

impl FilterControls {
    pub(crate) fn bind(dom: &Dom) -> Result<std::result::Result<Self, MissingControl>> {
        let Some(category) = dom.query_selector(CATEGORY_SELECTOR)? else {
            return Ok(Err(MissingControl::Category));
        };
        let mut attributes = [category; 3];
        for (slot, field) in attributes.iter_mut().zip(AttributeField::ALL) {
            match dom.query_selector(&attribute_selector(field))? {
                Some(node) => *slot = node,
                None => return Ok(Err(MissingControl::Attribute(field))),
            }
        }
        Ok(Ok(Self {
            category,
            attributes,
        }))
    }

    /// Every control that is present, for listener registration.
    pub(crate) fn present(dom: &Dom) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        if let Some(node) = dom.query_selector(CATEGORY_SELECTOR)? {
            out.push(node);
        }
        for field in AttributeField::ALL {
            if let Some(node) = dom.query_selector(&attribute_selector(field))? {
                out.push(node);
            }
        }
        Ok(out)
    }

    fn attribute_node(&self, field: AttributeField) -> NodeId {
        match field {
            AttributeField::Brand => self.attributes[0],
            AttributeField::Author => self.attributes[1],
            AttributeField::Size => self.attributes[2],
        }
    }

    pub(crate) fn category_value(&self, dom: &Dom) -> Result<String> {
        dom.value(self.category)
    }

    pub(crate) fn read(&self, dom: &Dom) -> Result<FilterState> {
        let mut state = FilterState::new(Category::from_value(&self.category_value(dom)?));
        for field in AttributeField::ALL {
            *state.attribute_mut(field) = dom.value(self.attribute_node(field))?;
        }
        Ok(state)
    }

    /// Writes `outcome` back. Only values that changed are written, so a
    /// mapped attribute keeps its selected option untouched.
    pub(crate) fn apply(&self, dom: &mut Dom, outcome: &FilterOutcome) -> Result<()> {
        if let Some(category) = outcome.state.category {
            if self.category_value(dom)? != category.as_value() {
                dom.set_value(self.category, category.as_value())?;
            }
        }
        for field in AttributeField::ALL {
            let node = self.attribute_node(field);
            let value = outcome.state.attribute(field);
            if dom.value(node)? != value {
                dom.set_value(node, value)?;
            }
            dom.set_disabled(node, outcome.is_disabled(field))?;
        }
        Ok(())
    }

    pub(crate) fn enable_all(&self, dom: &mut Dom) -> Result<()> {
        for field in AttributeField::ALL {
            dom.set_disabled(self.attribute_node(field), false)?;
        }
        Ok(())
    }
}

/// One full pass over the page's filter controls. Absent controls make the
/// pass a no-op.
pub(crate) fn sync_filter_controls(dom: &mut Dom) -> Result<SyncOutcome> {
    let controls = match FilterControls::bind(dom)? {
        Ok(controls) => controls,
        Err(missing) => return Ok(SyncOutcome::Skipped(missing)),
    };

    let category = controls.category_value(dom)?;
    if !category.is_empty() && Category::from_value(&category).is_none() {
        controls.enable_all(dom)?;
        return Ok(SyncOutcome::Unmapped { category });
    }

    let state = controls.read(dom)?;
    let outcome = synchronize(&state);
    controls.apply(dom, &outcome)?;
    Ok(SyncOutcome::Applied(outcome))
}
