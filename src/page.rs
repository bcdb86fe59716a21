use std::collections::HashMap;

use crate::dom::{Dom, NodeId, truncate_chars};
use crate::html::parse_html;
use crate::scripts::cart_ajax::CartEndpoint;
use crate::scripts::{self, Handler, Script};
use crate::{Error, Result};

const DISPATCH_STACK_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Default, Clone)]
struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Handler>>>,
}

impl ListenerStore {
    /// Registering the same handler twice for one node and event is a no-op,
    /// as with `addEventListener`.
    fn add(&mut self, node_id: NodeId, event: &str, handler: Handler) -> bool {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();
        if listeners.contains(&handler) {
            return false;
        }
        listeners.push(handler);
        true
    }

    fn get(&self, node_id: NodeId, event: &str) -> Vec<Handler> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    fn count(&self, event: &str) -> usize {
        self.map
            .values()
            .filter_map(|events| events.get(event))
            .map(Vec::len)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
}

/// A form submission the page asked the browser to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub form_id: Option<String>,
    pub method: String,
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A storefront page: the document, the listeners the installed scripts
/// registered, and everything the scripts did that leaves the page.
pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    installed: Vec<Script>,
    loaded: bool,
    now_ms: i64,
    submissions: Vec<FormSubmission>,
    cart_endpoint: Option<Box<dyn CartEndpoint>>,
    trace: bool,
    trace_events: bool,
    trace_scripts: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    /// Parses `html` and installs every storefront script it references
    /// through `<script src=...>`. Call [`Page::load`] to fire
    /// `DOMContentLoaded`.
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        let mut page = Self::with_dom(dom);

        let mut referenced = Vec::new();
        for node in page.dom.query_selector_all("script[src]")? {
            let src = page.dom.attr(node, "src").unwrap_or_default();
            if let Some(script) = Script::from_src(&src) {
                referenced.push(script);
            }
        }
        for script in referenced {
            page.install(script)?;
        }

        Ok(page)
    }

    /// Parses `html` without installing anything.
    pub fn bare(html: &str) -> Result<Self> {
        Ok(Self::with_dom(parse_html(html)?))
    }

    fn with_dom(dom: Dom) -> Self {
        Self {
            dom,
            listeners: ListenerStore::default(),
            installed: Vec::new(),
            loaded: false,
            now_ms: 0,
            submissions: Vec::new(),
            cart_endpoint: None,
            trace: false,
            trace_events: true,
            trace_scripts: true,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        }
    }

    /// Installs `script`. Installing the same script twice does nothing.
    pub fn install(&mut self, script: Script) -> Result<()> {
        if self.installed.contains(&script) {
            return Ok(());
        }
        self.installed.push(script);
        self.trace_script_line(format!("[script] install {}", script.file_name()));
        scripts::install(self, script)
    }

    pub fn installed(&self) -> &[Script] {
        &self.installed
    }

    /// Fires `DOMContentLoaded` on the document. Only the first call
    /// dispatches.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;
        let root = self.dom.root;
        stacker::grow(DISPATCH_STACK_SIZE, || {
            self.dispatch_event(root, "DOMContentLoaded")
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_scripts(&mut self, enabled: bool) {
        self.trace_scripts = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    /// Milliseconds since the Unix epoch, UTC. The page clock only moves
    /// when set.
    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn set_now_ms(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
    }

    pub fn set_cart_endpoint(&mut self, endpoint: impl CartEndpoint + 'static) {
        self.cart_endpoint = Some(Box::new(endpoint));
    }

    pub(crate) fn take_cart_endpoint(&mut self) -> Option<Box<dyn CartEndpoint>> {
        self.cart_endpoint.take()
    }

    pub(crate) fn restore_cart_endpoint(&mut self, endpoint: Box<dyn CartEndpoint>) {
        self.cart_endpoint = Some(endpoint);
    }

    pub fn submissions(&self) -> &[FormSubmission] {
        &self.submissions
    }

    pub fn take_submissions(&mut self) -> Vec<FormSubmission> {
        std::mem::take(&mut self.submissions)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        stacker::grow(DISPATCH_STACK_SIZE, || self.dispatch_event(target, "click"))
    }

    /// Picks the option with `value` in a select, the way a user would, and
    /// fires `input` then `change`. Disabled selects ignore the action.
    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let tag = self.dom.tag_name(target).unwrap_or_default().to_string();
        if !tag.eq_ignore_ascii_case("select") {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: tag,
            });
        }
        if self.dom.disabled(target) {
            return Ok(());
        }

        let mut known = false;
        for option in self.dom.select_options(target) {
            if self.dom.option_effective_value(option)? == value {
                known = true;
                break;
            }
        }
        if !known {
            return Err(Error::OptionNotFound {
                selector: selector.to_string(),
                value: value.to_string(),
            });
        }

        self.dom.set_value(target, value)?;
        stacker::grow(DISPATCH_STACK_SIZE, || {
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "change")
        })
    }

    /// Replaces the value of an input or textarea and fires `input` then
    /// `change`.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        stacker::grow(DISPATCH_STACK_SIZE, || {
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "change")
        })
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        stacker::grow(DISPATCH_STACK_SIZE, || self.dispatch_event(target, event))
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.dom.query_selector(selector)?.is_some())
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, &name.to_ascii_lowercase()))
    }

    pub fn is_disabled(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.dom.disabled(target))
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.dom.class_contains(target, class_name)
    }

    pub fn style(&self, selector: &str, property: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.style_get(target, property)
    }

    /// Number of listeners registered for `event` across the page.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.count(event)
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        self.check(selector, target, expected, &actual)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        self.check(selector, target, expected, &actual)
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.disabled(target);
        self.check(selector, target, &expected.to_string(), &actual.to_string())
    }

    pub fn assert_attr(&self, selector: &str, name: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self
            .dom
            .attr(target, &name.to_ascii_lowercase())
            .unwrap_or_default();
        self.check(selector, target, expected, &actual)
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn check(&self, selector: &str, target: NodeId, expected: &str, actual: &str) -> Result<()> {
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    pub(crate) fn add_listener(&mut self, node_id: NodeId, event: &str, handler: Handler) {
        if self.listeners.add(node_id, event, handler) && self.trace {
            let label = self.dom.node_label(node_id);
            self.trace_event_line(format!("[event] listen {event} on {label}"));
        }
    }

    /// Records a `form.submit()` call. Nothing is sent; the submission is
    /// kept for the caller to inspect.
    pub(crate) fn submit_form(&mut self, form: NodeId) -> Result<()> {
        let method = self
            .dom
            .attr(form, "method")
            .filter(|method| !method.is_empty())
            .unwrap_or_else(|| "get".into())
            .to_ascii_uppercase();
        let action = self.dom.attr(form, "action").unwrap_or_default();
        let submission = FormSubmission {
            form_id: self.dom.attr(form, "id"),
            method,
            action,
            fields: self.form_data_entries(form)?,
        };
        self.trace_script_line(format!(
            "[form] submit {} {} fields={}",
            submission.method,
            submission.action,
            submission.fields.len()
        ));
        self.submissions.push(submission);
        Ok(())
    }

    fn form_data_entries(&self, form: NodeId) -> Result<Vec<(String, String)>> {
        let mut controls = Vec::new();
        self.dom.collect_elements_descendants_dfs(form, &mut controls);

        let mut out = Vec::new();
        for control in controls {
            if !self.is_successful_control(control) {
                continue;
            }
            let name = self.dom.attr(control, "name").unwrap_or_default();
            let mut value = self.dom.value(control)?;
            if value.is_empty()
                && self
                    .input_kind(control)
                    .is_some_and(|kind| is_checkable_kind(&kind))
            {
                value = "on".into();
            }
            out.push((name, value));
        }
        Ok(out)
    }

    fn is_successful_control(&self, control: NodeId) -> bool {
        let is_control = ["input", "select", "textarea"]
            .iter()
            .any(|tag| self.dom.is_tag(control, tag));
        if !is_control || self.dom.disabled(control) {
            return false;
        }
        if self.dom.is_tag(control, "select") && !self.dom.has_selected_option(control) {
            return false;
        }
        if self
            .dom
            .attr(control, "name")
            .is_none_or(|name| name.is_empty())
        {
            return false;
        }
        match self.input_kind(control) {
            Some(kind) if matches!(kind.as_str(), "button" | "submit" | "reset" | "file" | "image") => {
                false
            }
            Some(kind) if is_checkable_kind(&kind) => self.dom.checked(control),
            _ => true,
        }
    }

    fn input_kind(&self, node_id: NodeId) -> Option<String> {
        if !self.dom.is_tag(node_id, "input") {
            return None;
        }
        Some(
            self.dom
                .attr(node_id, "type")
                .unwrap_or_else(|| "text".into())
                .to_ascii_lowercase(),
        )
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<()> {
        let mut event = EventState {
            event_type: event_type.to_string(),
            target,
            current_target: target,
        };

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        // Target first, then bubble towards the document.
        for node in path {
            event.current_target = node;
            self.invoke_listeners(&event)?;
        }

        if self.trace {
            let label = self.dom.node_label(target);
            self.trace_event_line(format!("[event] done {event_type} target={label}"));
        }
        Ok(())
    }

    fn invoke_listeners(&mut self, event: &EventState) -> Result<()> {
        let listeners = self
            .listeners
            .get(event.current_target, &event.event_type);
        for handler in listeners {
            if self.trace {
                let target_label = self.dom.node_label(event.target);
                let current_label = self.dom.node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} handler={}",
                    event.event_type,
                    target_label,
                    current_label,
                    handler.label()
                ));
            }
            scripts::run_handler(self, &handler, event)?;
        }
        Ok(())
    }

    /// `console.log` from a script.
    pub(crate) fn console_log(&mut self, line: impl AsRef<str>) {
        self.trace_script_line(format!("[console] {}", line.as_ref()));
    }

    pub(crate) fn trace_script_line(&mut self, line: String) {
        if self.trace && self.trace_scripts {
            self.trace_line(line);
        }
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }
}

fn is_checkable_kind(kind: &str) -> bool {
    kind == "checkbox" || kind == "radio"
}
