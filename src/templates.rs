/*!
 * Text templates for issues and pull requests.
 *
 * Templates are plain text with `{name}` placeholders, bundled into the
 * binary from the `templates/` directory.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Values substituted into a template
pub type Context = BTreeMap<&'static str, String>;

/// A text template with `{name}` placeholders
#[derive(Debug, Clone)]
pub struct Template {
    /// The template string with placeholders
    template: String,
}

impl Template {
    pub const BROKEN_LINKS_TITLE: &'static str = include_str!("../templates/issue-broken-links-title.txt");
    pub const BROKEN_LINKS_BODY: &'static str = include_str!("../templates/issue-broken-links-body.txt");
    pub const BROKEN_LINKS_ENTRY: &'static str = include_str!("../templates/issue-broken-links-entry.txt");
    pub const TRANSLATION_PR_TITLE: &'static str = include_str!("../templates/translation-pull-request-title.txt");
    pub const TRANSLATION_PR_BODY: &'static str = include_str!("../templates/translation-pull-request-body.txt");
    pub const UPDATE_MESSAGES_PR_TITLE: &'static str =
        include_str!("../templates/update-messages-pull-request-title.txt");
    pub const UPDATE_MESSAGES_PR_BODY: &'static str =
        include_str!("../templates/update-messages-pull-request-body.txt");

    /// Create a new template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template in a single pass
    ///
    /// Placeholders missing from `context` are left untouched, and inserted
    /// values are never rendered again.
    pub fn render(&self, context: &Context) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| match context.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a one-line template (titles), trimming surrounding whitespace
    pub fn render_line(&self, context: &Context) -> String {
        self.render(context).trim().to_string()
    }
}

/// `"s"` unless `count` is one
pub fn plural(count: usize) -> String {
    if count == 1 { String::new() } else { "s".to_string() }
}
