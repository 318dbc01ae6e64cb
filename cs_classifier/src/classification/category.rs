//! Classification vocabulary
//!
//! The tag set is closed. Consumers map tags to colors; the engine never
//! does.

use crate::symbols::SymbolKind;
use crate::utils::Span;
use serde::{Serialize, Serializer};
use std::fmt;

macro_rules! categories {
    ($($name:ident => $tag:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Category {
            $($name,)*
        }

        impl Category {
            pub const ALL: &'static [Category] = &[$(Category::$name),*];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Category::$name => $tag,)*
                }
            }

            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($tag => Some(Category::$name),)*
                    _ => None,
                }
            }
        }
    };
}

categories! {
    // === GENERAL ===
    Comment => "comment",
    ExcludedCode => "excluded code",
    Identifier => "identifier",
    Keyword => "keyword",
    Number => "number",
    Operator => "operator",
    OperatorOverloaded => "operator - overloaded",
    PreprocessorKeyword => "preprocessor keyword",
    PreprocessorText => "preprocessor text",
    Punctuation => "punctuation",
    String => "string",
    VerbatimString => "string - verbatim",
    StringEscape => "string - escape character",
    StaticSymbol => "static symbol",

    // === NAMES ===
    NamespaceName => "namespace name",
    ClassName => "class name",
    RecordClassName => "record class name",
    StructName => "struct name",
    RecordStructName => "record struct name",
    InterfaceName => "interface name",
    EnumName => "enum name",
    EnumMemberName => "enum member name",
    DelegateName => "delegate name",
    TypeParameterName => "type parameter name",
    FieldName => "field name",
    ConstantName => "constant name",
    PropertyName => "property name",
    EventName => "event name",
    MethodName => "method name",
    ExtensionMethodName => "extension method name",
    LocalName => "local name",
    ParameterName => "parameter name",
    LabelName => "label name",

    // === XML DOC ===
    XmlDocAttributeName => "xml doc comment - attribute name",
    XmlDocAttributeQuotes => "xml doc comment - attribute quotes",
    XmlDocAttributeValue => "xml doc comment - attribute value",
    XmlDocCData => "xml doc comment - cdata section",
    XmlDocComment => "xml doc comment - comment",
    XmlDocDelimiter => "xml doc comment - delimiter",
    XmlDocEntityReference => "xml doc comment - entity reference",
    XmlDocName => "xml doc comment - name",
    XmlDocProcessingInstruction => "xml doc comment - processing instruction",
    XmlDocText => "xml doc comment - text",

    // === REGEX ===
    RegexAnchor => "regex - anchor",
    RegexAlternation => "regex - alternation",
    RegexCharacterClass => "regex - character class",
    RegexComment => "regex - comment",
    RegexGrouping => "regex - grouping",
    RegexOtherEscape => "regex - other escape",
    RegexQuantifier => "regex - quantifier",
    RegexSelfEscapedCharacter => "regex - self escaped character",
    RegexText => "regex - text",

    // === JSON ===
    JsonArray => "json - array",
    JsonComment => "json - comment",
    JsonConstructorName => "json - constructor name",
    JsonKeyword => "json - keyword",
    JsonNumber => "json - number",
    JsonObject => "json - object",
    JsonOperator => "json - operator",
    JsonPropertyName => "json - property name",
    JsonPunctuation => "json - punctuation",
    JsonString => "json - string",
    JsonText => "json - text",
}

impl Category {
    /// Category a bound symbol of `kind` contributes
    pub fn for_symbol(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Namespace => Category::NamespaceName,
            SymbolKind::Class => Category::ClassName,
            SymbolKind::RecordClass => Category::RecordClassName,
            SymbolKind::Struct => Category::StructName,
            SymbolKind::RecordStruct => Category::RecordStructName,
            SymbolKind::Interface => Category::InterfaceName,
            SymbolKind::Enum => Category::EnumName,
            SymbolKind::EnumMember => Category::EnumMemberName,
            SymbolKind::Delegate => Category::DelegateName,
            SymbolKind::TypeParameter => Category::TypeParameterName,
            SymbolKind::Field => Category::FieldName,
            SymbolKind::Constant => Category::ConstantName,
            SymbolKind::Property => Category::PropertyName,
            SymbolKind::Event => Category::EventName,
            SymbolKind::Method | SymbolKind::LocalFunction => Category::MethodName,
            SymbolKind::ExtensionMethod => Category::ExtensionMethodName,
            SymbolKind::Local => Category::LocalName,
            SymbolKind::Parameter => Category::ParameterName,
            SymbolKind::Label => Category::LabelName,
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, Category::String | Category::VerbatimString | Category::StringEscape)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One output unit: a source range and its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassifiedSpan {
    pub span: Span,
    pub category: Category,
}

impl ClassifiedSpan {
    pub fn new(span: Span, category: Category) -> Self {
        Self { span, category }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }
}

impl Serialize for ClassifiedSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClassifiedSpan", 3)?;
        state.serialize_field("start", &self.span.start)?;
        state.serialize_field("length", &self.span.len())?;
        state.serialize_field("tag", self.category.as_str())?;
        state.end()
    }
}

/// Sort key: by start, longer first, then primary tags before the static decoration
pub fn sort_spans(spans: &mut [ClassifiedSpan]) {
    spans.sort_by_key(|classified| {
        (
            classified.span.start,
            std::cmp::Reverse(classified.span.end),
            classified.category == Category::StaticSymbol,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_names() {
        for &category in Category::ALL {
            assert_eq!(Category::from_tag(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_tag("bogus"), None);
    }

    #[test]
    fn test_symbol_categories() {
        assert_eq!(Category::for_symbol(SymbolKind::Local), Category::LocalName);
        assert_eq!(Category::for_symbol(SymbolKind::LocalFunction), Category::MethodName);
        assert_eq!(Category::for_symbol(SymbolKind::RecordStruct), Category::RecordStructName);
    }

    #[test]
    fn test_serializes_as_triple() {
        let classified = ClassifiedSpan::new(Span::new(4, 9), Category::ClassName);
        let json = serde_json::to_string(&classified).unwrap();
        assert_eq!(json, r#"{"start":4,"length":5,"tag":"class name"}"#);
    }

    #[test]
    fn test_static_decoration_sorts_after_primary() {
        let mut spans = vec![
            ClassifiedSpan::new(Span::new(0, 4), Category::StaticSymbol),
            ClassifiedSpan::new(Span::new(0, 4), Category::ClassName),
        ];
        sort_spans(&mut spans);
        assert_eq!(spans[0].category, Category::ClassName);
    }
}
