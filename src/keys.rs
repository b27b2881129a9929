//! Keybinding schemes and the label alphabet.
//!
//! A [`Scheme`] decides which physical keys act as label symbols and which
//! trigger cancel/commit. The [`Alphabet`] derived from a scheme is the
//! ordered symbol set the partition engine labels cells with; its size is
//! the branching factor of every decision tree, so switching schemes forces
//! a full rebuild of all trees (the coordinator enforces this).
//!
//! Key input arrives as [`KeyPress`] values. On the wire a key press is a
//! short string (`"a"`, `"ctrl+g"`, `"esc"`, `"enter"`), parsed
//! case-insensitively.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Label symbols for the emacs scheme: every lowercase letter, home row
/// first so the shortest reaches get the earliest labels.
const EMACS_SYMBOLS: &str = "asdfghjklqwertyuiopzxcvbnm";

/// Label symbols for the vi scheme: `h j k l` are reserved for cursor
/// motion, so they never appear in labels.
const VI_SYMBOLS: &str = "asdfgqwertyuiopzxcvbnm";

/// Built-in keybinding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Emacs,
    Vi,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Emacs => write!(f, "emacs"),
            Scheme::Vi => write!(f, "vi"),
        }
    }
}

impl FromStr for Scheme {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emacs" => Ok(Scheme::Emacs),
            "vi" | "vim" => Ok(Scheme::Vi),
            other => Err(KeyParseError(format!("unknown scheme: {:?}", other))),
        }
    }
}

impl Serialize for Scheme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: KeyParseError| DeError::custom(e))
    }
}

/// Error from parsing a key or scheme string.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct KeyParseError(String);

/// A physical key, reduced to what the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character (folded to lowercase).
    Char(char),
    Escape,
    Return,
    Backspace,
}

/// One key event fed to a navigation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    /// Whether Control was held.
    pub ctrl: bool,
}

impl KeyPress {
    /// A plain character press.
    pub fn char(c: char) -> Self {
        Self {
            key: Key::Char(c.to_ascii_lowercase()),
            ctrl: false,
        }
    }

    /// A Control-modified character press.
    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c.to_ascii_lowercase()),
            ctrl: true,
        }
    }

    pub fn escape() -> Self {
        Self {
            key: Key::Escape,
            ctrl: false,
        }
    }

    pub fn enter() -> Self {
        Self {
            key: Key::Return,
            ctrl: false,
        }
    }

    pub fn backspace() -> Self {
        Self {
            key: Key::Backspace,
            ctrl: false,
        }
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "ctrl+")?;
        }
        match self.key {
            Key::Char(c) => write!(f, "{}", c),
            Key::Escape => write!(f, "esc"),
            Key::Return => write!(f, "enter"),
            Key::Backspace => write!(f, "backspace"),
        }
    }
}

/// Parse a key press string (case-insensitive).
///
/// Accepts `"a"`, `"ctrl+g"` / `"c-g"`, `"esc"` / `"escape"`,
/// `"enter"` / `"return"`, `"backspace"` / `"bs"`.
fn parse_key(s: &str) -> Result<KeyPress, KeyParseError> {
    let normalized = s.trim().to_ascii_lowercase();

    let (ctrl, rest) = if let Some(rest) = normalized
        .strip_prefix("ctrl+")
        .or_else(|| normalized.strip_prefix("c-"))
    {
        (true, rest)
    } else {
        (false, normalized.as_str())
    };

    let key = match rest {
        "esc" | "escape" => Key::Escape,
        "enter" | "return" => Key::Return,
        "backspace" | "bs" => Key::Backspace,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c),
                _ => return Err(KeyParseError(format!("invalid key: {:?}", s))),
            }
        }
    };

    Ok(KeyPress { key, ctrl })
}

impl FromStr for KeyPress {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s)
    }
}

impl Serialize for KeyPress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for KeyPress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_key(&s).map_err(DeError::custom)
    }
}

/// How a key press relates to the active alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// The press is the label symbol at this index.
    Label(usize),
    /// Soft backtrack / abort.
    Cancel,
    /// Early resolution at the current node.
    Commit,
    /// Not meaningful to the session.
    Other,
}

/// The ordered label symbols for a scheme, plus cancel/commit
/// classification.
///
/// Symbols are deduplicated and keep their first-occurrence order; the
/// ordering decides label assignment (lexicographic over symbol indices),
/// so two alphabets with the same symbols in a different order produce
/// differently labeled trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    scheme: Scheme,
    symbols: Vec<char>,
}

impl Alphabet {
    /// The alphabet of a built-in scheme.
    pub fn for_scheme(scheme: Scheme) -> Self {
        let symbols = match scheme {
            Scheme::Emacs => EMACS_SYMBOLS,
            Scheme::Vi => VI_SYMBOLS,
        };
        Self::with_symbols(scheme, symbols)
    }

    /// An ad-hoc alphabet over `symbols` with the default (emacs) cancel
    /// and commit keys.
    pub fn custom(symbols: &str) -> Self {
        Self::with_symbols(Scheme::Emacs, symbols)
    }

    fn with_symbols(scheme: Scheme, symbols: &str) -> Self {
        let mut seen = Vec::new();
        for c in symbols.chars().map(|c| c.to_ascii_lowercase()) {
            if !seen.contains(&c) {
                seen.push(c);
            }
        }
        Self {
            scheme,
            symbols: seen,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Number of label symbols (the branching factor of partition trees).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The ordered symbol table.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// The symbol at `index`, if in range.
    pub fn symbol(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// The index of `c` in the symbol table, folding to lowercase.
    pub fn index_of(&self, c: char) -> Option<usize> {
        let c = c.to_ascii_lowercase();
        self.symbols.iter().position(|&s| s == c)
    }

    /// Classify a key press against this alphabet.
    pub fn classify(&self, press: &KeyPress) -> KeyClass {
        match press.key {
            Key::Escape | Key::Backspace => KeyClass::Cancel,
            Key::Return => KeyClass::Commit,
            Key::Char(c) => {
                if press.ctrl {
                    // C-g aborts in the emacs scheme only.
                    if self.scheme == Scheme::Emacs && c == 'g' {
                        KeyClass::Cancel
                    } else {
                        KeyClass::Other
                    }
                } else {
                    match self.index_of(c) {
                        Some(i) => KeyClass::Label(i),
                        None => KeyClass::Other,
                    }
                }
            }
        }
    }

    pub fn is_cancel(&self, press: &KeyPress) -> bool {
        self.classify(press) == KeyClass::Cancel
    }

    pub fn is_commit(&self, press: &KeyPress) -> bool {
        self.classify(press) == KeyClass::Commit
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emacs_alphabet_has_26_symbols() {
        let a = Alphabet::for_scheme(Scheme::Emacs);
        assert_eq!(a.len(), 26);
        assert_eq!(a.symbol(0), Some('a'));
    }

    #[test]
    fn vi_alphabet_excludes_motion_keys() {
        let a = Alphabet::for_scheme(Scheme::Vi);
        assert_eq!(a.len(), 22);
        for c in ['h', 'j', 'k', 'l'] {
            assert_eq!(a.index_of(c), None, "{} must not be a label symbol", c);
        }
    }

    #[test]
    fn custom_alphabet_deduplicates_preserving_order() {
        let a = Alphabet::custom("abcabca");
        assert_eq!(a.symbols(), &['a', 'b', 'c']);
    }

    #[test]
    fn classify_label_symbols() {
        let a = Alphabet::for_scheme(Scheme::Emacs);
        assert_eq!(a.classify(&KeyPress::char('a')), KeyClass::Label(0));
        assert_eq!(a.classify(&KeyPress::char('s')), KeyClass::Label(1));
        // Uppercase folds to the same symbol.
        assert_eq!(a.classify(&KeyPress::char('A')), KeyClass::Label(0));
    }

    #[test]
    fn classify_cancel_and_commit() {
        let a = Alphabet::for_scheme(Scheme::Emacs);
        assert!(a.is_cancel(&KeyPress::escape()));
        assert!(a.is_cancel(&KeyPress::backspace()));
        assert!(a.is_cancel(&KeyPress::ctrl('g')));
        assert!(a.is_commit(&KeyPress::enter()));
    }

    #[test]
    fn ctrl_g_only_cancels_in_emacs() {
        let vi = Alphabet::for_scheme(Scheme::Vi);
        assert_eq!(vi.classify(&KeyPress::ctrl('g')), KeyClass::Other);
    }

    #[test]
    fn digits_are_unrecognized() {
        let a = Alphabet::for_scheme(Scheme::Emacs);
        assert_eq!(a.classify(&KeyPress::char('1')), KeyClass::Other);
    }

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("Emacs".parse::<Scheme>().unwrap(), Scheme::Emacs);
        assert_eq!("VI".parse::<Scheme>().unwrap(), Scheme::Vi);
        assert_eq!("vim".parse::<Scheme>().unwrap(), Scheme::Vi);
        assert!("dvorak".parse::<Scheme>().is_err());
    }

    #[test]
    fn key_press_parses_wire_forms() {
        assert_eq!("a".parse::<KeyPress>().unwrap(), KeyPress::char('a'));
        assert_eq!("ctrl+g".parse::<KeyPress>().unwrap(), KeyPress::ctrl('g'));
        assert_eq!("C-g".parse::<KeyPress>().unwrap(), KeyPress::ctrl('g'));
        assert_eq!("esc".parse::<KeyPress>().unwrap(), KeyPress::escape());
        assert_eq!("Enter".parse::<KeyPress>().unwrap(), KeyPress::enter());
        assert_eq!("bs".parse::<KeyPress>().unwrap(), KeyPress::backspace());
        assert!("".parse::<KeyPress>().is_err());
        assert!("meta+x".parse::<KeyPress>().is_err());
    }

    #[test]
    fn key_press_display_round_trips() {
        for press in [
            KeyPress::char('q'),
            KeyPress::ctrl('g'),
            KeyPress::escape(),
            KeyPress::enter(),
            KeyPress::backspace(),
        ] {
            let rendered = press.to_string();
            assert_eq!(rendered.parse::<KeyPress>().unwrap(), press);
        }
    }

    #[test]
    fn key_press_serde_uses_strings() {
        let json = serde_json::to_string(&KeyPress::ctrl('g')).unwrap();
        assert_eq!(json, r#""ctrl+g""#);
        let back: KeyPress = serde_json::from_str(r#""esc""#).unwrap();
        assert_eq!(back, KeyPress::escape());
    }

    #[test]
    fn scheme_serde_uses_strings() {
        assert_eq!(serde_json::to_string(&Scheme::Vi).unwrap(), r#""vi""#);
        let back: Scheme = serde_json::from_str(r#""emacs""#).unwrap();
        assert_eq!(back, Scheme::Emacs);
    }
}
