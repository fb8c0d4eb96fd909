//! Named to positional placeholder rewriting.
//!
//! Compiled statements use `:name` placeholders. Drivers want `$1` (PostgreSQL)
//! or `?`. Quoted literals, quoted identifiers and `::` casts are left alone.

/// Positional placeholder flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2`; a name used twice reuses its index
    Dollar,
    /// `?`; every occurrence is its own parameter
    Question,
}

/// Rewritten SQL and the bind name behind each positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positional {
    pub sql: String,
    pub names: Vec<String>,
}

pub fn to_positional(sql: &str, style: PlaceholderStyle) -> Positional {
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                out.push_str("::");
                chars.next();
            }
            ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match style {
                    PlaceholderStyle::Dollar => {
                        let idx = match names.iter().position(|existing| *existing == name) {
                            Some(idx) => idx,
                            None => {
                                names.push(name);
                                names.len() - 1
                            }
                        };
                        out.push_str(&format!("${}", idx + 1));
                    }
                    PlaceholderStyle::Question => {
                        names.push(name);
                        out.push('?');
                    }
                }
            }
            _ => out.push(c),
        }
    }

    Positional { sql: out, names }
}
