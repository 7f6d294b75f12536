//! Assembling one block's text into an interactive tabbed panel.
//!
//! The builder runs the render-request path: split the block, parse each
//! title's directives, hand every tab body to the host renderer, and return
//! a [`TabPanel`] value tree the host applies to its real UI. A body that
//! absorbed a nested block is rendered as-is; the host renderer re-enters
//! the block processor for it, which is how panels nest.

use crate::config::Settings;
use crate::error::Result;
use crate::host::MarkdownRenderer;
use crate::splitter;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const SELECTED_CLASS: &str = "selected";

/// A minimal DOM-like node: tag, classes, inline style, text, children.
///
/// This is a value model handed to the host, not a UI; styling and
/// animation stay on the host side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name, e.g. `div`, `ul`, `li`.
    pub tag: String,
    /// CSS classes in application order.
    pub classes: Vec<String>,
    /// Verbatim inline style text.
    pub style: String,
    /// Text content rendered into this node.
    pub text: String,
    /// Child nodes in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element with the given tag.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Add a CSS class.
    pub fn add_class(&mut self, class: &str) {
        self.classes.push(class.to_string());
    }

    /// Builder-style class addition.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// True when the class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Remove all occurrences of a class.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Append a child and return a mutable reference to it.
    pub fn append(&mut self, child: Self) -> &mut Self {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        write!(f, "{pad}<{}", self.tag)?;
        if !self.classes.is_empty() {
            write!(f, " class=\"{}\"", self.classes.join(" "))?;
        }
        if !self.style.is_empty() {
            write!(f, " style=\"{}\"", self.style)?;
        }
        writeln!(f, ">")?;
        if !self.text.is_empty() {
            for line in self.text.lines() {
                writeln!(f, "{pad}  {line}")?;
            }
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Line span of one tab's body within the enclosing document, for hosts
/// that map panel content back to editor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabLineSpan {
    /// Zero-based line index of the body start within the block.
    pub line_offset: usize,
    /// Number of physical lines in the body.
    pub line_count: usize,
}

/// The assembled panel: an element tree plus the interaction state the host
/// drives through [`switch_tab`](Self::switch_tab).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabPanel {
    /// The `tab-panel-container` root.
    pub root: Element,
    /// Number of tabs; 0 means the block rendered as a single untitled tab.
    pub tab_count: usize,
    /// Currently selected tab index.
    pub selected: usize,
    /// Per-tab body line spans, parallel to the tab list.
    pub line_spans: Vec<TabLineSpan>,
    /// Count of inline footnotes occurring before this block in the
    /// enclosing document; the host offsets rendered footnote references by
    /// this to keep numbering continuous.
    pub footnote_offset: usize,
}

impl TabPanel {
    /// Select a tab: the `selected` class moves to the tab and content at
    /// `index`. Out-of-range indices are ignored.
    pub fn switch_tab(&mut self, index: usize) {
        if self.tab_count == 0 || index >= self.tab_count {
            return;
        }
        if let Some(tabs) = self.tab_list_mut() {
            for (i, tab) in tabs.children.iter_mut().enumerate() {
                tab.remove_class(SELECTED_CLASS);
                if i == index {
                    tab.add_class(SELECTED_CLASS);
                }
            }
        }
        if let Some(contents) = self.content_container_mut() {
            for (i, content) in contents.children.iter_mut().enumerate() {
                content.remove_class(SELECTED_CLASS);
                if i == index {
                    content.add_class(SELECTED_CLASS);
                }
            }
        }
        self.selected = index;
    }

    fn tab_list_mut(&mut self) -> Option<&mut Element> {
        self.root.children.first_mut()?.children.first_mut()
    }

    fn content_container_mut(&mut self) -> Option<&mut Element> {
        self.root.children.get_mut(1)
    }
}

/// Builds [`TabPanel`]s from block text under the current settings.
#[derive(Debug, Clone)]
pub struct PanelBuilder<'a> {
    settings: &'a Settings,
    footnote_offset: usize,
}

impl<'a> PanelBuilder<'a> {
    /// Create a builder.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            footnote_offset: 0,
        }
    }

    /// Supply the count of inline footnotes occurring before this block in
    /// the enclosing document (see
    /// [`extract::inline_footnotes_before`](crate::extract::inline_footnotes_before)).
    #[must_use]
    pub const fn with_footnote_offset(mut self, offset: usize) -> Self {
        self.footnote_offset = offset;
        self
    }

    /// Assemble the panel for one block's raw text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) when the configured tab
    /// marker cannot be compiled; malformed block content itself never
    /// fails, it falls back to a single untitled tab.
    pub fn build(
        &self,
        block_text: &str,
        source_path: &str,
        renderer: &mut dyn MarkdownRenderer,
    ) -> Result<TabPanel> {
        let mut root = Element::new("div").with_class("tab-panel-container");
        if self.settings.highlight_selected_tab_name {
            root.add_class("highlight-selected-tab-name");
        }

        let mut scroll = Element::new("div").with_class("tab-scroll-container");
        scroll.append(Element::new("ul").with_class("tab-container"));
        let mut contents = Element::new("div").with_class("content-container");

        let split = splitter::split(block_text, self.settings.marker())?;

        if split.tabs.is_empty() {
            debug!(source_path, "no tab markers in block, rendering untitled");
            scroll.add_class("hide-container");

            let content = contents.append(Element::new("div"));
            renderer.render(block_text, content, source_path);
            if self.settings.show_no_tab_warning {
                renderer.render(&self.no_tab_warning(), content, source_path);
            }
            content.add_class(SELECTED_CLASS);

            root.children.push(scroll);
            root.children.push(contents);
            return Ok(TabPanel {
                root,
                tab_count: 0,
                selected: 0,
                line_spans: Vec::new(),
                footnote_offset: self.footnote_offset,
            });
        }

        let mut line_spans = Vec::with_capacity(split.tabs.len());
        for tab in &split.tabs {
            let tab_el = {
                let el = scroll.children[0].append(Element::new("li").with_class("tab"));
                for class in &tab.attributes.css_classes {
                    el.add_class(class);
                }
                el.style = tab.attributes.inline_style.clone();
                el
            };
            renderer.render(&tab.attributes.display_title, tab_el, source_path);

            let content = contents.append(Element::new("div"));
            for class in &tab.attributes.css_classes {
                content.add_class(class);
            }
            content.style = tab.attributes.inline_style.clone();
            renderer.render(&tab.body, content, source_path);

            line_spans.push(TabLineSpan {
                line_offset: tab.line_offset,
                line_count: tab.line_count,
            });
        }

        root.children.push(scroll);
        root.children.push(contents);
        let mut panel = TabPanel {
            root,
            tab_count: split.tabs.len(),
            selected: 0,
            line_spans,
            footnote_offset: self.footnote_offset,
        };
        panel.switch_tab(split.default_index);
        Ok(panel)
    }

    fn no_tab_warning(&self) -> String {
        format!(
            "> [!WARNING] No tabs created\n\
             > To create tabs, use '{} Tab Name'.\n\
             > To hide this warning, disable \"Show no tab warning\" in the settings.",
            self.settings.marker()
        )
    }
}

/// Bounded retry with doubling backoff, for layout-settling polls.
///
/// Calls `op` up to `max_attempts` times, sleeping `initial_delay` (doubled
/// each round) between attempts, and returns the first `Some`. The cap is
/// the point: a scroll container that never reports a position gives up
/// instead of polling forever.
pub fn retry_with_backoff<T, F>(max_attempts: usize, initial_delay: Duration, mut op: F) -> Option<T>
where
    F: FnMut(usize) -> Option<T>,
{
    let mut delay = initial_delay;
    for attempt in 0..max_attempts {
        if let Some(value) = op(attempt) {
            return Some(value);
        }
        if attempt + 1 < max_attempts {
            std::thread::sleep(delay);
            delay = delay.saturating_mul(2);
        }
    }
    None
}
