use scraper::node::Text;
use scraper::{ElementRef, Html, Node};

/// Read and write access to the markup the dashboard works against.
///
/// Lookups that find nothing return empty results; writes to missing
/// targets are no-ops.
pub trait Page: Send {
    /// Text content of every element carrying `class`, in document order.
    fn class_texts(&self, class: &str) -> Vec<String>;

    /// `class` attribute of the element sibling that follows the element with `id`.
    fn sibling_class(&self, id: &str) -> Option<String>;

    /// Replace the children of the element(s) with `id` by `markup`.
    /// Returns false when no such element exists.
    fn set_inner_html(&mut self, id: &str, markup: &str) -> bool;

    /// Replace the text of every child element of each element carrying `class`.
    /// Returns the number of elements carrying `class`.
    fn set_children_text(&mut self, class: &str, text: &str) -> usize;

    /// Serialized markup in its current state.
    fn render(&self) -> String;
}

/// [`Page`] over an HTML document.
///
/// The document is kept serialized so the page can move freely between
/// tasks; every operation parses it, and writes store the re-serialized tree.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    markup: String,
}

impl HtmlPage {
    pub fn parse(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.markup)
    }
}

fn elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Detach every child of the node with the given id.
macro_rules! clear_children {
    ($doc:expr, $id:expr) => {
        while let Some(mut node) = $doc.tree.get_mut($id) {
            match node.first_child() {
                Some(mut child) => child.detach(),
                None => break,
            }
        }
    };
}

/// Swap the children of every element accepted by `matches` for the nodes
/// parsed from `markup`. Returns the number of elements rewritten.
fn replace_children(
    doc: &mut Html,
    matches: impl Fn(&ElementRef<'_>) -> bool,
    markup: &str,
) -> usize {
    let targets: Vec<_> = elements(doc).filter(|e| matches(e)).map(|e| e.id()).collect();
    if targets.is_empty() {
        return 0;
    }

    let fragment = Html::parse_fragment(markup);
    for &target in &targets {
        clear_children!(doc, target);

        let mut pending = vec![(*fragment.root_element(), target)];
        while let Some((source, parent)) = pending.pop() {
            for child in source.children() {
                let Some(mut parent_node) = doc.tree.get_mut(parent) else {
                    break;
                };
                let id = parent_node.append(child.value().clone()).id();
                pending.push((child, id));
            }
        }
    }
    targets.len()
}

impl Page for HtmlPage {
    fn class_texts(&self, class: &str) -> Vec<String> {
        let doc = self.document();
        elements(&doc)
            .filter(|e| has_class(e, class))
            .map(|e| e.text().collect::<String>())
            .collect()
    }

    fn sibling_class(&self, id: &str) -> Option<String> {
        let doc = self.document();
        let element = elements(&doc).find(|e| e.value().id() == Some(id))?;
        let sibling = element.next_siblings().find_map(ElementRef::wrap)?;
        let class = sibling.value().attr("class")?.trim();
        if class.is_empty() {
            None
        } else {
            Some(class.to_string())
        }
    }

    fn set_inner_html(&mut self, id: &str, markup: &str) -> bool {
        let mut doc = self.document();
        let replaced = replace_children(&mut doc, |e| e.value().id() == Some(id), markup);
        if replaced == 0 {
            return false;
        }

        self.markup = doc.html();
        true
    }

    fn set_children_text(&mut self, class: &str, text: &str) -> usize {
        let mut doc = self.document();
        let containers = elements(&doc).filter(|e| has_class(e, class)).count();
        if containers == 0 {
            return 0;
        }

        let child_of_container = |e: &ElementRef<'_>| {
            e.parent()
                .and_then(ElementRef::wrap)
                .is_some_and(|parent| has_class(&parent, class))
        };
        let targets: Vec<_> = elements(&doc)
            .filter(|e| child_of_container(e))
            .map(|e| e.id())
            .collect();
        for target in targets {
            clear_children!(doc, target);
            if let Some(mut node) = doc.tree.get_mut(target) {
                node.append(Node::Text(Text { text: text.into() }));
            }
        }

        self.markup = doc.html();
        containers
    }

    fn render(&self) -> String {
        self.markup.clone()
    }
}

/// Escape text for use in HTML content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
