//! Token categories and their dual dark/light colours.

use std::fmt;

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Terminal background the colours are chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// One colour per theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DualColor {
    pub dark: Rgb,
    pub light: Rgb,
}

impl DualColor {
    pub const fn new(dark: Rgb, light: Rgb) -> Self {
        Self { dark, light }
    }

    pub fn for_theme(&self, theme: Theme) -> Rgb {
        match theme {
            Theme::Dark => self.dark,
            Theme::Light => self.light,
        }
    }
}

/// Colour of unclassified code text.
pub const NEUTRAL: DualColor = DualColor::new(Rgb::new(220, 220, 220), Rgb::new(40, 40, 40));

/// Syntactic category of a code token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenCategory {
    Keyword,
    Type,
    String,
    Number,
    Comment,
    ClassName,
    FunctionName,
    Builtin,
    Exception,
    Operator,
    Punctuation,
    Tag,
    Attribute,
    Plain,
}

impl TokenCategory {
    pub const fn color(self) -> DualColor {
        use TokenCategory::*;
        let (dark, light) = match self {
            Keyword | Tag => ((0, 150, 255), (0, 70, 180)),
            Type | Attribute => ((100, 200, 255), (0, 110, 160)),
            ClassName | FunctionName => ((255, 255, 0), (150, 110, 0)),
            Builtin => ((255, 100, 255), (150, 0, 150)),
            Exception => ((255, 100, 0), (190, 60, 0)),
            String => ((0, 255, 0), (0, 130, 0)),
            Number => ((255, 165, 0), (180, 90, 0)),
            Comment => ((128, 128, 128), (120, 120, 120)),
            Operator | Punctuation => ((255, 255, 255), (40, 40, 40)),
            Plain => return NEUTRAL,
        };
        DualColor::new(
            Rgb::new(dark.0, dark.1, dark.2),
            Rgb::new(light.0, light.1, light.2),
        )
    }

    /// Whether punctuation nested inside this category takes its colour.
    pub fn absorbs_punctuation(self) -> bool {
        matches!(self, TokenCategory::String | TokenCategory::Comment | TokenCategory::Tag)
    }
}

/// Map a dotted scope name to a category.
pub fn category_for_scope(scope: &str) -> Option<TokenCategory> {
    let has = |prefix: &str| scope == prefix || scope.starts_with(&format!("{prefix}."));

    let category = if has("comment") {
        TokenCategory::Comment
    } else if has("string") || has("constant.character.escape") {
        TokenCategory::String
    } else if has("constant.numeric") {
        TokenCategory::Number
    } else if has("constant.language") {
        TokenCategory::Keyword
    } else if has("keyword.operator") {
        TokenCategory::Operator
    } else if has("keyword") || has("storage.modifier") {
        TokenCategory::Keyword
    } else if has("storage.type.primitive") || has("storage.type.numeric") {
        TokenCategory::Type
    } else if has("storage.type") {
        TokenCategory::Keyword
    } else if scope.contains("exception") && (has("support.type") || has("support.class")) {
        TokenCategory::Exception
    } else if has("support.type")
        || has("support.class")
        || has("entity.name.type")
        || has("entity.other.inherited-class")
    {
        TokenCategory::Type
    } else if has("entity.name.class")
        || has("entity.name.struct")
        || has("entity.name.enum")
        || has("entity.name.interface")
    {
        TokenCategory::ClassName
    } else if has("entity.name.function") || has("variable.function") {
        TokenCategory::FunctionName
    } else if has("support.function") || has("variable.language") {
        TokenCategory::Builtin
    } else if has("entity.name.tag") {
        TokenCategory::Tag
    } else if has("entity.other.attribute-name") {
        TokenCategory::Attribute
    } else if has("punctuation") {
        TokenCategory::Punctuation
    } else {
        return None;
    };
    Some(category)
}

/// Resolve the category of a scope stack given innermost-last.
///
/// The innermost mapped scope wins, except that punctuation inside a
/// string, comment or tag takes the enclosing category.
pub fn category_for_stack(
    scopes: impl DoubleEndedIterator<Item = Option<TokenCategory>>,
) -> TokenCategory {
    let mut found: Option<TokenCategory> = None;
    for category in scopes.rev().flatten() {
        match found {
            None if category != TokenCategory::Punctuation => return category,
            None => found = Some(category),
            Some(_) if category.absorbs_punctuation() => return category,
            Some(_) => {}
        }
    }
    found.unwrap_or(TokenCategory::Plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_mapping() {
        assert_eq!(
            category_for_scope("keyword.control.flow.return.python"),
            Some(TokenCategory::Keyword)
        );
        assert_eq!(
            category_for_scope("storage.type.function.python"),
            Some(TokenCategory::Keyword)
        );
        assert_eq!(
            category_for_scope("storage.type.primitive.java"),
            Some(TokenCategory::Type)
        );
        assert_eq!(
            category_for_scope("keyword.operator.assignment"),
            Some(TokenCategory::Operator)
        );
        assert_eq!(category_for_scope("source.python"), None);
        assert_eq!(category_for_scope("stringy"), None);
    }

    #[test]
    fn test_punctuation_inside_string() {
        let stack = vec![
            None,
            Some(TokenCategory::String),
            Some(TokenCategory::Punctuation),
        ];
        assert_eq!(category_for_stack(stack.into_iter()), TokenCategory::String);
    }

    #[test]
    fn test_innermost_wins() {
        let stack = vec![Some(TokenCategory::String), Some(TokenCategory::Number)];
        assert_eq!(category_for_stack(stack.into_iter()), TokenCategory::Number);
    }

    #[test]
    fn test_bare_punctuation() {
        let stack = vec![None, Some(TokenCategory::Punctuation)];
        assert_eq!(category_for_stack(stack.into_iter()), TokenCategory::Punctuation);
        assert_eq!(category_for_stack(Vec::new().into_iter()), TokenCategory::Plain);
    }

    #[test]
    fn test_themes_differ() {
        let kw = TokenCategory::Keyword.color();
        assert_eq!(kw.for_theme(Theme::Dark), Rgb::new(0, 150, 255));
        assert_ne!(kw.dark, kw.light);
        assert_eq!(TokenCategory::Plain.color(), NEUTRAL);
    }
}
