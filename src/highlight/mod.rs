//! Syntax highlighting for stored snippets.
//!
//! Rendering happens once, when a snippet is created; the resulting markup
//! is persisted and served as-is afterwards.

use std::fmt::Write as _;

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::{Error, Result};

/// CSS class of the block wrapping the highlighted code.
pub const SOURCE_CSS_CLASS: &str = "source";

const STYLESHEET_THEME: &str = "InspiredGitHub";

/// Language tags offered by the snippet form, with their display labels.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("bash", "Bash"),
    ("c", "C"),
    ("csharp", "C#"),
    ("clj", "Clojure"),
    ("cl", "Common Lisp"),
    ("cpp", "C++"),
    ("css", "CSS"),
    ("erlang", "Erlang"),
    ("go", "Go"),
    ("haskell", "Haskell"),
    ("html", "HTML"),
    ("java", "Java"),
    ("javascript", "Javascript"),
    ("lua", "Lua"),
    ("ocaml", "OCaml"),
    ("perl", "Perl"),
    ("php", "PHP"),
    ("text", "Plain Text"),
    ("python", "Python"),
    ("ruby", "Ruby"),
    ("scheme", "Scheme"),
    ("sql", "SQL"),
];

pub const DEFAULT_LANGUAGE: &str = "text";

/// Maps form tags onto syntect lookup tokens (file extensions).
fn syntax_token(tag: &str) -> &str {
    match tag {
        "csharp" => "cs",
        "cl" => "lisp",
        "scheme" => "scm",
        "erlang" => "erl",
        "haskell" => "hs",
        "javascript" => "js",
        "ocaml" => "ml",
        "perl" => "pl",
        "python" => "py",
        "ruby" => "rb",
        "text" => "txt",
        other => other,
    }
}

/// Returns the display label for a known tag.
#[must_use]
pub fn language_label(tag: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(tag))
        .map(|(_, label)| *label)
}

pub struct Highlighter {
    syntax_set: SyntaxSet,
    stylesheet: String,
}

impl Highlighter {
    pub fn new() -> Result<Self> {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .get(STYLESHEET_THEME)
            .ok_or_else(|| Error::Highlight(format!("missing theme {STYLESHEET_THEME}")))?;
        let stylesheet = css_for_theme_with_class_style(theme, ClassStyle::Spaced)
            .map_err(|e| Error::Highlight(e.to_string()))?;

        Ok(Self {
            syntax_set,
            stylesheet,
        })
    }

    /// Stylesheet matching the classes emitted by [`Highlighter::render`].
    #[must_use]
    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    /// Looks up the syntax for a tag, falling back to plain text.
    fn syntax_for(&self, language_tag: &str) -> &SyntaxReference {
        let tag = language_tag.trim().to_ascii_lowercase();
        match self.syntax_set.find_syntax_by_token(syntax_token(&tag)) {
            Some(syntax) => syntax,
            None => {
                tracing::debug!("No lexer for '{language_tag}', using plain text");
                self.syntax_set.find_syntax_plain_text()
            }
        }
    }

    /// Renders `raw_content` as a two-column table: line numbers on the
    /// left, class-annotated code inside `div.source` on the right.
    pub fn render(&self, raw_content: &str, language_tag: &str) -> Result<String> {
        let highlighted = self.classed_code(raw_content, self.syntax_for(language_tag));
        let code = self.or_plain_text(highlighted, raw_content, language_tag)?;

        let line_count = raw_content.lines().count().max(1);
        let mut linenos = String::new();
        for n in 1..=line_count {
            if n > 1 {
                linenos.push('\n');
            }
            let _ = write!(linenos, "{n}");
        }

        Ok(format!(
            "<table class=\"sourcetable\"><tr>\
             <td class=\"linenos\"><pre>{linenos}</pre></td>\
             <td class=\"code\"><div class=\"{SOURCE_CSS_CLASS}\"><pre>{code}</pre></div></td>\
             </tr></table>"
        ))
    }

    fn classed_code(&self, raw_content: &str, syntax: &SyntaxReference) -> Result<String> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);

        for line in LinesWithEndings::from(raw_content) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| Error::Highlight(e.to_string()))?;
        }
        Ok(generator.finalize())
    }

    /// A lexer failure degrades to plain text instead of failing the snippet.
    fn or_plain_text(
        &self,
        highlighted: Result<String>,
        raw_content: &str,
        language_tag: &str,
    ) -> Result<String> {
        match highlighted {
            Ok(code) => Ok(code),
            Err(e) => {
                tracing::warn!("Highlighting as '{language_tag}' failed, using plain text: {e}");
                self.classed_code(raw_content, self.syntax_set.find_syntax_plain_text())
            }
        }
    }
}
