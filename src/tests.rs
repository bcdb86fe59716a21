use super::*;
use crate::dom::Dom;
use crate::filters::{FilterControls, sync_filter_controls};
use crate::html::parse_html;
use crate::selector::parse_selector_groups;

const FILTER_FORM: &str = r#"
<!DOCTYPE html>
<form id="filters" method="get" action="/products">
  <select name="category">
    <option value="">All categories</option>
    <option value="electronics">Electronics</option>
    <option value="books">Books</option>
    <option value="clothing">Clothing</option>
  </select>
  <select name="brand">
    <option value="">Any brand</option>
    <option value="Nike">Nike</option>
    <option value="Sony">Sony</option>
  </select>
  <select name="author">
    <option value="">Any author</option>
    <option value="Tolkien">Tolkien</option>
  </select>
  <select name="size">
    <option value="">Any size</option>
    <option value="M">M</option>
  </select>
</form>
"#;

fn filter_dom() -> Result<Dom> {
    parse_html(FILTER_FORM)
}

fn select_value(dom: &Dom, name: &str) -> Result<String> {
    let node = dom
        .query_selector(&format!("select[name=\"{name}\"]"))?
        .ok_or_else(|| Error::SelectorNotFound(name.to_string()))?;
    dom.value(node)
}

fn select_disabled(dom: &Dom, name: &str) -> Result<bool> {
    let node = dom
        .query_selector(&format!("select[name=\"{name}\"]"))?
        .ok_or_else(|| Error::SelectorNotFound(name.to_string()))?;
    Ok(dom.disabled(node))
}

fn choose(dom: &mut Dom, name: &str, value: &str) -> Result<()> {
    let node = dom
        .query_selector(&format!("select[name=\"{name}\"]"))?
        .ok_or_else(|| Error::SelectorNotFound(name.to_string()))?;
    dom.set_value(node, value)
}

#[test]
fn select_value_defaults_to_first_option_or_selected_one() -> Result<()> {
    let dom = parse_html(
        r#"
        <select id="a"><option value="x">X</option><option value="y">Y</option></select>
        <select id="b"><option value="x">X</option><option value="y" selected>Y</option></select>
        <select id="c"><option>  Plain text  </option></select>
        <select id="d"></select>
        "#,
    )?;
    let value_of = |id: &str| -> Result<String> {
        let node = dom
            .by_id(id)
            .ok_or_else(|| Error::SelectorNotFound(id.to_string()))?;
        dom.value(node)
    };
    assert_eq!(value_of("a")?, "x");
    assert_eq!(value_of("b")?, "y");
    assert_eq!(value_of("c")?, "Plain text");
    assert_eq!(value_of("d")?, "");
    Ok(())
}

#[test]
fn option_text_values_collapse_inner_whitespace() -> Result<()> {
    let mut page = Page::from_html(
        "<select id=\"author\"><option>Any</option><option> Le \n  Guin </option></select>",
    )?;
    page.select_option("#author", "Le Guin")?;
    page.assert_value("#author", "Le Guin")?;
    assert!(matches!(
        page.select_option("#author", "Le  Guin"),
        Err(Error::OptionNotFound { .. })
    ));
    Ok(())
}

#[test]
fn unmatched_select_value_drops_out_of_submissions() -> Result<()> {
    let mut page = Page::bare(
        r#"<form id="f" method="post" action="/cart">
             <select name="size"><option value="M">M</option></select>
             <input name="qty" value="1">
           </form>"#,
    )?;
    let form = page.select_one("#f")?;
    let size = page.select_one("select")?;
    assert!(page.dom.has_selected_option(size));

    page.dom.set_value(size, "XXL")?;
    assert!(!page.dom.has_selected_option(size));
    page.submit_form(form)?;
    assert_eq!(
        page.submissions()[0].fields,
        vec![("qty".to_string(), "1".to_string())]
    );

    page.dom.set_value(size, "M")?;
    page.submit_form(form)?;
    assert_eq!(page.submissions()[1].field("size"), Some("M"));
    Ok(())
}

#[test]
fn setting_an_unknown_select_value_empties_it() -> Result<()> {
    let mut dom = filter_dom()?;
    choose(&mut dom, "brand", "Sony")?;
    assert_eq!(select_value(&dom, "brand")?, "Sony");
    choose(&mut dom, "brand", "Adidas")?;
    assert_eq!(select_value(&dom, "brand")?, "");
    Ok(())
}

#[test]
fn html_parser_decodes_entities_and_skips_comments() -> Result<()> {
    let dom = parse_html(
        r#"<!-- header --><p id="t" title="Tom &amp; Jerry">5&nbsp;&euro; &lt;b&gt; &#65;&#x42;</p>"#,
    )?;
    let node = dom
        .by_id("t")
        .ok_or_else(|| Error::SelectorNotFound("#t".into()))?;
    assert_eq!(dom.text_content(node), "5\u{a0}€ <b> AB");
    assert_eq!(dom.attr(node, "title").as_deref(), Some("Tom & Jerry"));
    Ok(())
}

#[test]
fn html_parser_keeps_script_bodies_as_text() -> Result<()> {
    let dom = parse_html(
        r#"<div id="out"></div><script>if (a < b) { document.write("<p>"); }</script>"#,
    )?;
    assert!(dom.query_selector("p")?.is_none());
    assert!(dom.query_selector("script")?.is_some());
    Ok(())
}

#[test]
fn html_parser_rejects_unclosed_markup() {
    assert!(matches!(parse_html("<div"), Err(Error::HtmlParse(_))));
    assert!(matches!(parse_html("<!-- open"), Err(Error::HtmlParse(_))));
    assert!(matches!(
        parse_html("<p title=\"open>x</p>"),
        Err(Error::HtmlParse(_))
    ));
}

#[test]
fn boolean_attributes_set_flags() -> Result<()> {
    let dom = parse_html(r#"<select id="s" disabled><option>a</option></select>"#)?;
    let node = dom
        .by_id("s")
        .ok_or_else(|| Error::SelectorNotFound("#s".into()))?;
    assert!(dom.disabled(node));
    Ok(())
}

#[test]
fn selector_parser_accepts_storefront_selectors() -> Result<()> {
    for selector in [
        "select[name=\"category\"]",
        "select[name='brand']",
        ".password-eye[data-target=\"password2\"]",
        "form > input[name=qty]",
        "#cart-total",
        "[data-add-to-cart]",
        "select:disabled, input:enabled",
    ] {
        parse_selector_groups(selector)?;
    }
    Ok(())
}

#[test]
fn selector_parser_rejects_malformed_input() {
    for selector in ["", "  ", "a,", "[name", "div >", "> div", "a:hover", "#"] {
        assert!(
            matches!(
                parse_selector_groups(selector),
                Err(Error::UnsupportedSelector(_))
            ),
            "selector {selector:?} should be rejected"
        );
    }
}

#[test]
fn selectors_match_descendants_children_and_pseudo_classes() -> Result<()> {
    let dom = parse_html(
        r#"
        <form id="f"><div><input name="qty" value="1"></div></form>
        <select name="size" disabled><option>M</option></select>
        "#,
    )?;
    assert!(dom.query_selector("form input[name=\"qty\"]")?.is_some());
    assert!(dom.query_selector("form > input")?.is_none());
    assert!(dom.query_selector("div > input")?.is_some());
    assert!(dom.query_selector("select:disabled")?.is_some());
    assert!(dom.query_selector("select:enabled")?.is_none());
    Ok(())
}

#[test]
fn closest_walks_up_to_the_form() -> Result<()> {
    let dom = parse_html(r#"<form id="f"><p><button id="b">+</button></p></form>"#)?;
    let button = dom
        .by_id("b")
        .ok_or_else(|| Error::SelectorNotFound("#b".into()))?;
    assert_eq!(dom.closest(button, "form")?, dom.by_id("f"));
    assert_eq!(dom.closest(button, "table")?, None);
    Ok(())
}

#[test]
fn category_rules_map_each_category_to_one_attribute() {
    assert_eq!(Category::Electronics.mapped_attribute(), AttributeField::Brand);
    assert_eq!(Category::Books.mapped_attribute(), AttributeField::Author);
    assert_eq!(Category::Clothing.mapped_attribute(), AttributeField::Size);
    for rule in CATEGORY_RULES {
        let excluded = rule.excluded().collect::<Vec<_>>();
        assert_eq!(excluded.len(), 2);
        assert!(!excluded.contains(&rule.allowed));
        assert_eq!(CategoryRule::for_attribute(rule.allowed), &rule);
    }
}

#[test]
fn category_values_parse_exactly() {
    assert_eq!(Category::from_value("books"), Some(Category::Books));
    assert_eq!(Category::from_value("Books"), None);
    assert_eq!(Category::from_value(""), None);
    for category in Category::ALL {
        assert_eq!(Category::from_value(category.as_value()), Some(category));
    }
}

#[test]
fn known_category_clears_and_disables_the_other_two() {
    for category in Category::ALL {
        let state = FilterState::new(Some(category))
            .with(AttributeField::Brand, "Nike")
            .with(AttributeField::Author, "Tolkien")
            .with(AttributeField::Size, "M");
        let outcome = synchronize(&state);
        let mapped = category.mapped_attribute();

        assert_eq!(outcome.state.category, Some(category));
        for field in AttributeField::ALL {
            if field == mapped {
                assert!(!outcome.is_disabled(field));
                assert_eq!(outcome.state.attribute(field), state.attribute(field));
            } else {
                assert!(outcome.is_disabled(field));
                assert_eq!(outcome.state.attribute(field), "");
            }
        }
    }
}

#[test]
fn brand_alone_infers_electronics() {
    let state = FilterState::new(None).with(AttributeField::Brand, "Nike");
    let outcome = synchronize(&state);
    assert_eq!(outcome.state.category, Some(Category::Electronics));
    assert_eq!(outcome.state.brand, "Nike");
    assert_eq!(outcome.state.author, "");
    assert_eq!(outcome.state.size, "");
    assert_eq!(
        outcome.disabled,
        vec![AttributeField::Author, AttributeField::Size]
    );
}

#[test]
fn author_and_size_infer_their_categories() {
    let books = synchronize(&FilterState::new(None).with(AttributeField::Author, "Tolkien"));
    assert_eq!(books.state.category, Some(Category::Books));
    assert_eq!(books.disabled, vec![AttributeField::Brand, AttributeField::Size]);

    let clothing = synchronize(&FilterState::new(None).with(AttributeField::Size, "M"));
    assert_eq!(clothing.state.category, Some(Category::Clothing));
    assert_eq!(
        clothing.disabled,
        vec![AttributeField::Brand, AttributeField::Author]
    );
}

#[test]
fn inference_prefers_brand_then_author() {
    let outcome = synchronize(
        &FilterState::new(None)
            .with(AttributeField::Brand, "Nike")
            .with(AttributeField::Author, "Tolkien"),
    );
    assert_eq!(outcome.state.category, Some(Category::Electronics));
    assert_eq!(outcome.state.author, "");

    let outcome = synchronize(
        &FilterState::new(None)
            .with(AttributeField::Author, "Tolkien")
            .with(AttributeField::Size, "M"),
    );
    assert_eq!(outcome.state.category, Some(Category::Books));
    assert_eq!(outcome.state.size, "");
}

#[test]
fn nothing_selected_leaves_everything_enabled() {
    let state = FilterState::default();
    let outcome = synchronize(&state);
    assert_eq!(outcome.state, state);
    assert!(outcome.disabled.is_empty());
}

#[test]
fn synchronize_is_idempotent_on_examples() {
    let states = [
        FilterState::default(),
        FilterState::new(None).with(AttributeField::Size, "M"),
        FilterState::new(Some(Category::Books)).with(AttributeField::Brand, "Nike"),
        FilterState::new(None)
            .with(AttributeField::Brand, "Nike")
            .with(AttributeField::Size, "M"),
    ];
    for state in states {
        let once = synchronize(&state);
        let twice = synchronize(&once.state);
        assert_eq!(once, twice);
    }
}

#[test]
fn adapter_applies_inference_to_the_selects() -> Result<()> {
    let mut dom = filter_dom()?;
    choose(&mut dom, "brand", "Nike")?;

    let outcome = sync_filter_controls(&mut dom)?;
    assert!(matches!(outcome, SyncOutcome::Applied(_)));
    assert_eq!(select_value(&dom, "category")?, "electronics");
    assert_eq!(select_value(&dom, "brand")?, "Nike");
    assert!(!select_disabled(&dom, "brand")?);
    assert!(select_disabled(&dom, "author")?);
    assert!(select_disabled(&dom, "size")?);
    Ok(())
}

#[test]
fn adapter_reenables_attributes_when_category_changes() -> Result<()> {
    let mut dom = filter_dom()?;
    choose(&mut dom, "category", "electronics")?;
    sync_filter_controls(&mut dom)?;
    assert!(select_disabled(&dom, "author")?);

    choose(&mut dom, "category", "books")?;
    sync_filter_controls(&mut dom)?;
    assert!(!select_disabled(&dom, "author")?);
    assert!(select_disabled(&dom, "brand")?);
    assert!(select_disabled(&dom, "size")?);
    Ok(())
}

#[test]
fn adapter_reports_missing_controls_without_touching_the_rest() -> Result<()> {
    let mut dom = parse_html(
        r#"
        <select name="category"><option value="books" selected>Books</option></select>
        <select name="brand"><option value="Nike" selected>Nike</option></select>
        <select name="author"><option value="">Any</option></select>
        "#,
    )?;
    assert_eq!(
        FilterControls::bind(&dom)?,
        Err(MissingControl::Attribute(AttributeField::Size))
    );

    let outcome = sync_filter_controls(&mut dom)?;
    assert_eq!(
        outcome,
        SyncOutcome::Skipped(MissingControl::Attribute(AttributeField::Size))
    );
    assert_eq!(select_value(&dom, "brand")?, "Nike");
    assert!(!select_disabled(&dom, "brand")?);
    Ok(())
}

#[test]
fn unmapped_category_enables_everything_and_keeps_values() -> Result<()> {
    let mut dom = parse_html(
        r#"
        <select name="category"><option value="toys" selected>Toys</option></select>
        <select name="brand" disabled><option value="Lego" selected>Lego</option></select>
        <select name="author"><option value="Tolkien" selected>Tolkien</option></select>
        <select name="size"><option value="">Any</option></select>
        "#,
    )?;
    let outcome = sync_filter_controls(&mut dom)?;
    assert_eq!(
        outcome,
        SyncOutcome::Unmapped {
            category: "toys".into()
        }
    );
    assert!(!select_disabled(&dom, "brand")?);
    assert_eq!(select_value(&dom, "brand")?, "Lego");
    assert_eq!(select_value(&dom, "author")?, "Tolkien");
    Ok(())
}

#[test]
fn script_sources_resolve_by_file_name() {
    assert_eq!(
        Script::from_src("/static/js/product_filters.js?v=3"),
        Some(Script::ProductFilters)
    );
    assert_eq!(Script::from_src("cart.js"), Some(Script::Cart));
    assert_eq!(
        Script::from_src("https://shop.example/static/js/cart_ajax.js#x"),
        Some(Script::CartAjax)
    );
    assert_eq!(Script::from_src("/static/js/app.js"), None);
    assert_eq!(Script::from_src(""), None);
}

#[test]
fn page_installs_referenced_scripts_once() -> Result<()> {
    let html = format!(
        "{FILTER_FORM}<script src=\"/static/js/product_filters.js\"></script>\
         <script src=\"/static/js/product_filters.js\"></script>"
    );
    let mut page = Page::from_html(&html)?;
    assert_eq!(page.installed(), &[Script::ProductFilters]);
    assert_eq!(page.listener_count("DOMContentLoaded"), 1);

    page.load()?;
    page.load()?;
    assert_eq!(page.listener_count("change"), 4);
    Ok(())
}

#[test]
fn bare_page_installs_nothing() -> Result<()> {
    let html = format!("{FILTER_FORM}<script src=\"/static/js/product_filters.js\"></script>");
    let mut page = Page::bare(&html)?;
    page.load()?;
    assert!(page.installed().is_empty());
    assert_eq!(page.listener_count("change"), 0);
    Ok(())
}

#[test]
fn trace_logs_capture_filter_passes_when_enabled() -> Result<()> {
    let html = format!("{FILTER_FORM}<script src=\"/static/js/product_filters.js\"></script>");
    let mut page = Page::from_html(&html)?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.load()?;
    page.select_option("select[name=\"author\"]", "Tolkien")?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.contains("[event] DOMContentLoaded")));
    assert!(
        logs.iter()
            .any(|line| line.contains("[filters] category=\"books\" disabled=[brand,size]"))
    );
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_categories_can_disable_event_logs() -> Result<()> {
    let html = format!("{FILTER_FORM}<script src=\"/static/js/product_filters.js\"></script>");
    let mut page = Page::from_html(&html)?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.set_trace_events(false);
    page.load()?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[filters]")));
    assert!(logs.iter().all(|line| !line.starts_with("[event]")));
    Ok(())
}

#[test]
fn trace_logs_are_empty_when_trace_is_disabled() -> Result<()> {
    let html = format!("{FILTER_FORM}<script src=\"/static/js/product_filters.js\"></script>");
    let mut page = Page::from_html(&html)?;
    page.load()?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_log_limit_keeps_latest_entries() -> Result<()> {
    let html = format!("{FILTER_FORM}<script src=\"/static/js/product_filters.js\"></script>");
    let mut page = Page::from_html(&html)?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.load()?;
    page.set_trace_log_limit(2)?;

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().any(|line| line.starts_with("[event] done DOMContentLoaded")));

    assert!(matches!(
        page.set_trace_log_limit(0),
        Err(Error::Config(_))
    ));
    Ok(())
}

#[test]
fn select_option_rejects_unknown_values_and_non_selects() -> Result<()> {
    let html = format!("{FILTER_FORM}<input id=\"q\" name=\"q\">");
    let mut page = Page::from_html(&html)?;
    match page.select_option("select[name=\"brand\"]", "Adidas") {
        Err(Error::OptionNotFound { value, .. }) => assert_eq!(value, "Adidas"),
        other => panic!("expected OptionNotFound, got {other:?}"),
    }
    match page.select_option("#q", "x") {
        Err(Error::TypeMismatch { expected, .. }) => assert_eq!(expected, "select"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    match page.click("#nope") {
        Err(Error::SelectorNotFound(selector)) => assert_eq!(selector, "#nope"),
        other => panic!("expected SelectorNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn type_text_updates_text_controls_only() -> Result<()> {
    let mut page = Page::from_html(
        r#"<form><textarea name="comment">draft</textarea><input id="q" name="q"></form>
           <select id="s"><option>a</option></select>"#,
    )?;
    page.assert_value("textarea", "draft")?;
    page.type_text("textarea", "Great lamp")?;
    page.assert_value("textarea", "Great lamp")?;
    page.type_text("#q", "lamp")?;
    page.assert_value("#q", "lamp")?;

    match page.type_text("#s", "b") {
        Err(Error::TypeMismatch { actual, .. }) => assert_eq!(actual, "select"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn script_trace_lines_can_be_switched_off() -> Result<()> {
    let mut page = Page::from_html(
        r#"<input type="password" id="password"><script src="/static/js/login.js"></script>"#,
    )?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.set_trace_scripts(false);
    page.load()?;

    let logs = page.take_trace_logs();
    assert!(!logs.is_empty());
    assert!(logs.iter().all(|line| line.starts_with("[event]")));
    Ok(())
}

#[test]
fn load_marks_the_page_loaded() -> Result<()> {
    let mut page = Page::from_html(r#"<div id="app"></div>"#)?;
    assert!(!page.is_loaded());
    page.load()?;
    assert!(page.is_loaded());
    assert!(page.exists("#app")?);
    assert!(!page.exists("#missing")?);
    page.assert_exists("#app")?;
    assert!(matches!(
        page.assert_exists("#missing"),
        Err(Error::SelectorNotFound(_))
    ));
    Ok(())
}

#[test]
fn assertion_failures_carry_a_snippet() -> Result<()> {
    let page = Page::from_html(r#"<span id="cart-total">0.00 €</span>"#)?;
    page.assert_text("#cart-total", "0.00 €")?;
    match page.assert_text("#cart-total", "1.00 €") {
        Err(Error::AssertionFailed {
            actual,
            dom_snippet,
            ..
        }) => {
            assert_eq!(actual, "0.00 €");
            assert!(dom_snippet.contains("id=\"cart-total\""));
        }
        other => panic!("expected AssertionFailed, got {other:?}"),
    }
    Ok(())
}

#[test]
fn errors_render_readable_messages() {
    assert_eq!(
        Error::SelectorNotFound("#x".into()).to_string(),
        "selector not found: #x"
    );
    assert_eq!(
        Error::OptionNotFound {
            selector: "select[name=\"brand\"]".into(),
            value: "Adidas".into(),
        }
        .to_string(),
        "no option with value \"Adidas\" in select[name=\"brand\"]"
    );
    assert_eq!(
        Error::Pattern("integer prefix pattern failed to compile".into()).to_string(),
        "pattern error: integer prefix pattern failed to compile"
    );
    assert_ne!(
        Error::Pattern("x".into()).to_string(),
        Error::Config("x".into()).to_string()
    );
}
