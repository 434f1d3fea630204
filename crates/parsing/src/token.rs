//! Delimited-expression scanning.

const ESCAPE: u8 = b'\\';

/// Scans text for `open ... close` expressions and substitutes each one with the value
/// returned by a handler.
///
/// A delimiter immediately preceded by a backslash is literal text: the backslash is dropped
/// and the delimiter is kept. An open delimiter without a matching close delimiter is emitted
/// verbatim together with the rest of the input, and the handler is not called for it.
/// Nested expressions are not supported; the first unescaped close delimiter ends the scan of
/// the current expression.
///
/// ```rust
/// use mapr_parsing::TokenScanner;
///
/// let scanner = TokenScanner::new("${", "}");
/// let out = scanner.scan("jdbc:${vendor}://host", |key| key.to_uppercase());
/// assert_eq!(out, "jdbc:VENDOR://host");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenScanner<'d> {
    open: &'d str,
    close: &'d str,
}

impl<'d> TokenScanner<'d> {
    #[must_use]
    pub const fn new(open: &'d str, close: &'d str) -> Self {
        Self { open, close }
    }

    #[must_use]
    pub const fn open(&self) -> &'d str {
        self.open
    }

    #[must_use]
    pub const fn close(&self) -> &'d str {
        self.close
    }

    /// Produces the substituted copy of `text`.
    pub fn scan<F>(&self, text: &str, mut handler: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        if text.is_empty() || self.open.is_empty() || self.close.is_empty() {
            return text.to_owned();
        }

        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut expression = String::new();
        let mut offset = 0;
        let mut start = find_from(text, self.open, offset);

        while let Some(open_at) = start {
            if open_at > offset && bytes[open_at - 1] == ESCAPE {
                out.push_str(&text[offset..open_at - 1]);
                out.push_str(self.open);
                offset = open_at + self.open.len();
            } else {
                expression.clear();
                out.push_str(&text[offset..open_at]);
                offset = open_at + self.open.len();

                let mut end = find_from(text, self.close, offset);
                while let Some(close_at) = end {
                    if close_at > offset && bytes[close_at - 1] == ESCAPE {
                        expression.push_str(&text[offset..close_at - 1]);
                        expression.push_str(self.close);
                        offset = close_at + self.close.len();
                        end = find_from(text, self.close, offset);
                    } else {
                        expression.push_str(&text[offset..close_at]);
                        break;
                    }
                }

                match end {
                    Some(close_at) => {
                        out.push_str(&handler(&expression));
                        offset = close_at + self.close.len();
                    },
                    None => {
                        out.push_str(&text[open_at..]);
                        offset = text.len();
                    },
                }
            }
            start = find_from(text, self.open, offset);
        }

        if offset < text.len() {
            out.push_str(&text[offset..]);
        }
        out
    }
}

fn find_from(text: &str, needle: &str, offset: usize) -> Option<usize> {
    text.get(offset..)?.find(needle).map(|at| at + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: TokenScanner<'static> = TokenScanner::new("${", "}");

    fn upper(key: &str) -> String {
        key.to_uppercase()
    }

    #[test]
    fn replaces_each_expression() {
        assert_eq!(VARS.scan("${a}", upper), "A");
        assert_eq!(VARS.scan("x ${a} y ${bc} z", upper), "x A y BC z");
        assert_eq!(VARS.scan("${a}${b}", upper), "AB");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(VARS.scan("", upper), "");
    }

    #[test]
    fn escaped_open_delimiter_is_literal() {
        let mut calls = 0;
        let out = VARS.scan(r"\${a}", |k| {
            calls += 1;
            k.to_owned()
        });
        assert_eq!(out, "${a}");
        assert_eq!(calls, 0);
    }

    #[test]
    fn escaped_close_delimiter_belongs_to_the_expression() {
        let mut seen = Vec::new();
        let out = VARS.scan(r"${a\}b}", |k| {
            seen.push(k.to_owned());
            "v".to_owned()
        });
        assert_eq!(out, "v");
        assert_eq!(seen, vec!["a}b".to_owned()]);
    }

    #[test]
    fn unterminated_expression_is_verbatim() {
        let mut called = false;
        let out = VARS.scan("pre ${a", |_| {
            called = true;
            String::new()
        });
        assert_eq!(out, "pre ${a");
        assert!(!called);
    }

    #[test]
    fn first_close_ends_nested_expression() {
        assert_eq!(VARS.scan("${a${b}}", |k| format!("<{k}>")), "<a${b>}");
    }

    #[test]
    fn custom_delimiters() {
        let params = TokenScanner::new("#{", "}");
        assert_eq!(params.scan("id = #{id} and ${raw}", |_| "?".to_owned()), "id = ? and ${raw}");
    }

    #[test]
    fn multibyte_text_is_preserved() {
        assert_eq!(VARS.scan("héllo ${wörld} ✓", upper), "héllo WÖRLD ✓");
    }
}
