//! Escaping helpers for values that end up inside SOQL or SOAP payloads.
//!
//! Every user-provided value placed in a SOQL string literal or an XML
//! element MUST go through these functions.
//!
//! ```rust
//! use busbar_sf_client::security::{soql, xml};
//!
//! let query = format!(
//!     "SELECT Id FROM AuraDefinitionBundle WHERE DeveloperName = '{}'",
//!     soql::escape_string("O'Brien")
//! );
//! assert!(query.ends_with("'O\\'Brien'"));
//!
//! assert_eq!(xml::escape("a<b"), "a&lt;b");
//! ```

/// SOQL escaping utilities for injection prevention.
pub mod soql {
    /// Escape a string value for use in SOQL string literals.
    ///
    /// Single quotes, backslashes, newlines, carriage returns and tabs are
    /// backslash-escaped.
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Render values as a parenthesized, quoted SOQL list for `IN` clauses.
    ///
    /// ```rust
    /// use busbar_sf_client::security::soql;
    ///
    /// assert_eq!(soql::quoted_list(["Email", "Report"]), "('Email', 'Report')");
    /// ```
    #[must_use]
    pub fn quoted_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|v| format!("'{}'", escape_string(v)))
            .collect();
        format!("({})", quoted.join(", "))
    }
}

/// XML escaping utilities for SOAP/Metadata API.
pub mod xml {
    /// Escape a string for safe inclusion in XML content.
    ///
    /// This escapes the five predefined XML entities.
    ///
    /// ```rust
    /// use busbar_sf_client::security::xml;
    ///
    /// let safe = xml::escape("Hello <World> & 'Friends'");
    /// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
    /// ```
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Reverse [`escape`] for text pulled out of SOAP responses.
    ///
    /// Unknown entities are left untouched.
    #[must_use]
    pub fn unescape(value: &str) -> String {
        if !value.contains('&') {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(idx) = rest.find('&') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];
            let replaced = [
                ("&amp;", '&'),
                ("&lt;", '<'),
                ("&gt;", '>'),
                ("&quot;", '"'),
                ("&apos;", '\''),
            ]
            .iter()
            .find(|(entity, _)| tail.starts_with(entity));

            match replaced {
                Some((entity, ch)) => {
                    out.push(*ch);
                    rest = &tail[entity.len()..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}
