//! Component-wise name patterns.
//!
//! Patterns are written over name components rather than characters:
//!
//! * `<KEY>` matches the single component `KEY`, `<>` matches any single component;
//! * `[<a><b>]` matches one of the listed components, `[^<KEY>]` any component but those;
//! * every atom may be followed by `*`, `+`, `?`, `{n}`, `{n,}`, `{,m}` or `{n,m}`;
//! * `^` and `$` anchor the pattern to the start and the end of the name.
//!
//! Literals are written escaped, the way [Name] displays components, so `<test%20node>`
//! matches the component `test node`. Whitespace is never part of a pattern.
//!
//! `^<zoneA><KEY><>{1,3}$` therefore matches `/zoneA/KEY/k`, `/zoneA/KEY/k/self/1`, but not
//! `/zoneA/KEY` or `/zoneA/test/KEY/k`.

use super::name::{unescape_component, Name};
use super::{Error, Result};

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Any,
    Literal(String),
    OneOf(Vec<String>),
    NoneOf(Vec<String>),
}

impl Atom {
    fn matches(&self, component: &str) -> bool {
        match self {
            Atom::Any => true,
            Atom::Literal(literal) => literal == component,
            Atom::OneOf(set) => set.iter().any(|c| c == component),
            Atom::NoneOf(set) => !set.iter().any(|c| c == component),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    atom: Atom,
    min: usize,
    max: Option<usize>,
}

/// A compiled name pattern.
#[derive(Clone)]
pub struct NamePattern {
    source: String,
    elements: Vec<Element>,
    anchored_start: bool,
    anchored_end: bool,
}

impl NamePattern {
    pub fn parse(source: &str) -> Result<NamePattern> {
        Parser::new(source).parse()
    }

    /// The pattern matching exactly `name` (anchored at both ends).
    pub fn exact(name: &Name) -> NamePattern {
        let elements = name
            .components()
            .iter()
            .map(|c| Element { atom: Atom::Literal(c.clone()), min: 1, max: Some(1) })
            .collect();
        NamePattern {
            source: format!("^{}$", name.to_pattern()),
            elements,
            anchored_start: true,
            anchored_end: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &Name) -> bool {
        let components = name.components();
        if self.anchored_start {
            self.match_from(0, components, 0)
        } else {
            (0..=components.len()).any(|start| self.match_from(0, components, start))
        }
    }

    fn match_from(&self, e: usize, components: &[String], c: usize) -> bool {
        if e == self.elements.len() {
            return !self.anchored_end || c == components.len();
        }
        let element = &self.elements[e];
        // Longest run first, then backtrack
        let mut n = 0;
        while c + n < components.len()
            && element.max.map_or(true, |max| n < max)
            && element.atom.matches(&components[c + n])
        {
            n += 1;
        }
        if n < element.min {
            return false;
        }
        (element.min..=n).rev().any(|k| self.match_from(e + 1, components, c + k))
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for NamePattern {}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl FromStr for NamePattern {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        NamePattern::parse(source)
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser { source, chars: source.chars().collect(), pos: 0 }
    }

    fn error(&self) -> Error {
        Error::InvalidPattern(self.source.to_owned())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).cloned()
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn parse(mut self) -> Result<NamePattern> {
        let mut anchored_start = false;
        let mut anchored_end = false;
        let mut elements = vec![];

        if self.peek() == Some('^') {
            anchored_start = true;
            self.pos += 1;
        }
        while let Some(ch) = self.peek() {
            let atom = match ch {
                '<' => match self.component()? {
                    Some(literal) => Atom::Literal(literal),
                    None => Atom::Any,
                },
                '[' => self.set()?,
                '$' if self.pos == self.chars.len() - 1 => {
                    anchored_end = true;
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error()),
            };
            let (min, max) = self.quantifier()?;
            elements.push(Element { atom, min, max });
        }

        Ok(NamePattern { source: self.source.to_owned(), elements, anchored_start, anchored_end })
    }

    /// `<literal>` or `<>`
    fn component(&mut self) -> Result<Option<String>> {
        self.expect('<')?;
        let mut literal = String::new();
        loop {
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('<') | Some('/') | None => return Err(self.error()),
                Some(ch) if ch.is_whitespace() => return Err(self.error()),
                Some(ch) => {
                    literal.push(ch);
                    self.pos += 1;
                }
            }
        }
        Ok(if literal.is_empty() { None } else { Some(unescape_component(&literal)) })
    }

    /// `[<a><b>]` or `[^<a><b>]`
    fn set(&mut self) -> Result<Atom> {
        self.expect('[')?;
        let negated = if self.peek() == Some('^') {
            self.pos += 1;
            true
        } else {
            false
        };
        let mut members = vec![];
        while self.peek() == Some('<') {
            match self.component()? {
                Some(literal) => members.push(literal),
                None => return Err(self.error()),
            }
        }
        self.expect(']')?;
        if members.is_empty() {
            return Err(self.error());
        }
        Ok(if negated { Atom::NoneOf(members) } else { Atom::OneOf(members) })
    }

    fn quantifier(&mut self) -> Result<(usize, Option<usize>)> {
        let bounds = match self.peek() {
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('?') => (0, Some(1)),
            Some('{') => return self.repetition(),
            _ => return Ok((1, Some(1))),
        };
        self.pos += 1;
        Ok(bounds)
    }

    /// `{n}`, `{n,}`, `{,m}`, `{n,m}`
    fn repetition(&mut self) -> Result<(usize, Option<usize>)> {
        self.expect('{')?;
        let mut body = String::new();
        loop {
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(ch) if ch.is_ascii_digit() || ch == ',' => {
                    body.push(ch);
                    self.pos += 1;
                }
                _ => return Err(self.error()),
            }
        }
        let number = |s: &str| -> Result<Option<usize>> {
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<usize>().map(Some).map_err(|_| self.error())
            }
        };
        let (min, max) = match body.find(',') {
            None => {
                let n = number(&body)?.ok_or_else(|| self.error())?;
                (n, Some(n))
            }
            Some(i) => (number(&body[..i])?.unwrap_or(0), number(&body[i + 1..])?),
        };
        if let Some(max) = max {
            if max < min {
                return Err(self.error());
            }
        }
        Ok((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        NamePattern::parse(pattern).unwrap().is_match(&Name::from(name))
    }

    #[test]
    fn test_key_locator_pattern() {
        let p = "^<zoneA><KEY><>{1,3}$";
        assert!(matches(p, "/zoneA/KEY/k"));
        assert!(matches(p, "/zoneA/KEY/k/self/1"));
        assert!(!matches(p, "/zoneA/KEY"));
        assert!(!matches(p, "/zoneA/KEY/k/self/1/extra"));
        assert!(!matches(p, "/zoneA/test/KEY/k"));
    }

    #[test]
    fn test_open_suffix() {
        let p = "^<zoneA><SIGN><>*$";
        assert!(matches(p, "/zoneA/SIGN"));
        assert!(matches(p, "/zoneA/SIGN/zoneA/test/prefix/KEY/k"));
        assert!(!matches(p, "/zoneA/SCHEMA/CONTENT"));
    }

    #[test]
    fn test_negated_set() {
        let p = "^<zoneA><test><prefix>[^<KEY>]*$";
        assert!(matches(p, "/zoneA/test/prefix"));
        assert!(matches(p, "/zoneA/test/prefix/7"));
        assert!(matches(p, "/zoneA/test/prefix/a/b"));
        assert!(!matches(p, "/zoneA/test/prefix/KEY/k"));
        assert!(!matches(p, "/zoneA/test/prefix/a/KEY"));
    }

    #[test]
    fn test_sets_and_quantifiers() {
        assert!(matches("^[<a><b>]+$", "/a/b/a"));
        assert!(!matches("^[<a><b>]+$", "/a/c"));
        assert!(matches("^<a>?<b>$", "/b"));
        assert!(matches("^<a>{2}$", "/a/a"));
        assert!(!matches("^<a>{2}$", "/a"));
        assert!(matches("^<a>{2,}$", "/a/a/a"));
        assert!(matches("^<>{,1}$", "/"));
    }

    #[test]
    fn test_unanchored_search() {
        assert!(matches("<KEY><>", "/x/KEY/k/y"));
        assert!(!matches("<KEY><>$", "/x/KEY"));
        assert!(matches("^<x>", "/x/KEY/k"));
    }

    #[test]
    fn test_exact() {
        let name = Name::from("/zoneA/SCHEMA");
        let pattern = NamePattern::exact(&name);
        assert_eq!(pattern.as_str(), "^<zoneA><SCHEMA>$");
        assert!(pattern.is_match(&name));
        assert!(!pattern.is_match(&Name::from("/zoneA/SCHEMA/CONTENT")));
    }

    #[test]
    fn test_escaped_literals() {
        let name = Name::from_components(vec!["zoneA", "test node", "[x]"]);
        let pattern = NamePattern::parse(&format!("^{}<>*$", name.to_pattern())).unwrap();
        assert_eq!(pattern.as_str(), "^<zoneA><test%20node><%5Bx%5D><>*$");
        assert!(pattern.is_match(&name));
        assert!(pattern.is_match(&name.clone().append("1")));
        assert!(!pattern.is_match(&Name::from("/zoneA/test")));
        assert!(NamePattern::exact(&name).is_match(&name));
    }

    #[test]
    fn test_invalid_patterns() {
        for p in ["<a", "[]", "[^]", "<a>{3,1}", "<a>{x}", "a", "<a>$<b>", "<a/b>", "<a b>"].iter() {
            assert!(NamePattern::parse(p).is_err(), "{} should not parse", p);
        }
    }
}
