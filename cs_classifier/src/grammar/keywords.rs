//! C# keyword tables
//!
//! Reserved keywords always lex as `Token::Keyword`. Contextual
//! keywords lex as identifiers; the parser promotes them to keywords by
//! position, so the same spelling can still name a type, local or member.

use serde::{Deserialize, Serialize};

macro_rules! keywords {
    (
        reserved { $($rname:ident => $rtext:literal),* $(,)? }
        contextual { $($cname:ident => $ctext:literal),* $(,)? }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Keyword {
            $($rname,)*
            $($cname,)*
        }

        impl Keyword {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$rname => $rtext,)*
                    $(Self::$cname => $ctext,)*
                }
            }

            pub const fn is_contextual(self) -> bool {
                match self {
                    $(Self::$cname => true,)*
                    _ => false,
                }
            }
        }

        /// Look up a reserved keyword by spelling
        pub fn reserved_keyword(text: &str) -> Option<Keyword> {
            match text {
                $($rtext => Some(Keyword::$rname),)*
                _ => None,
            }
        }

        /// Look up a contextual keyword by spelling
        pub fn contextual_keyword(text: &str) -> Option<Keyword> {
            match text {
                $($ctext => Some(Keyword::$cname),)*
                _ => None,
            }
        }

        pub const RESERVED_KEYWORDS: &[Keyword] = &[$(Keyword::$rname),*];
        pub const CONTEXTUAL_KEYWORDS: &[Keyword] = &[$(Keyword::$cname),*];
    };
}

keywords! {
    reserved {
        Abstract => "abstract", As => "as", Base => "base", Bool => "bool",
        Break => "break", Byte => "byte", Case => "case", Catch => "catch",
        Char => "char", Checked => "checked", Class => "class", Const => "const",
        Continue => "continue", Decimal => "decimal", Default => "default",
        Delegate => "delegate", Do => "do", Double => "double", Else => "else",
        Enum => "enum", Event => "event", Explicit => "explicit", Extern => "extern",
        False => "false", Finally => "finally", Fixed => "fixed", Float => "float",
        For => "for", Foreach => "foreach", Goto => "goto", If => "if",
        Implicit => "implicit", In => "in", Int => "int", Interface => "interface",
        Internal => "internal", Is => "is", Lock => "lock", Long => "long",
        Namespace => "namespace", New => "new", Null => "null", Object => "object",
        Operator => "operator", Out => "out", Override => "override",
        Params => "params", Private => "private", Protected => "protected",
        Public => "public", Readonly => "readonly", Ref => "ref", Return => "return",
        Sbyte => "sbyte", Sealed => "sealed", Short => "short", Sizeof => "sizeof",
        Stackalloc => "stackalloc", Static => "static", String => "string",
        Struct => "struct", Switch => "switch", This => "this", Throw => "throw",
        True => "true", Try => "try", Typeof => "typeof", Uint => "uint",
        Ulong => "ulong", Unchecked => "unchecked", Unsafe => "unsafe",
        Ushort => "ushort", Using => "using", Virtual => "virtual", Void => "void",
        Volatile => "volatile", While => "while",
    }
    contextual {
        Add => "add", Alias => "alias", And => "and", Args => "args",
        Ascending => "ascending", Assembly => "assembly", Async => "async",
        Await => "await", By => "by", Descending => "descending",
        Dynamic => "dynamic", Equals => "equals", Field => "field", File => "file",
        From => "from", Get => "get", Global => "global", Group => "group",
        Init => "init", Into => "into", Join => "join", Let => "let",
        Managed => "managed", Method => "method", Module => "module",
        Nameof => "nameof", Nint => "nint", Not => "not", Notnull => "notnull",
        Nuint => "nuint", On => "on", Or => "or", Orderby => "orderby",
        Param => "param", Partial => "partial", Property => "property",
        Record => "record", Remove => "remove", Required => "required",
        Scoped => "scoped", Select => "select", Set => "set",
        Type => "type", Typevar => "typevar", Unmanaged => "unmanaged",
        Value => "value", Var => "var", When => "when", Where => "where",
        With => "with", Yield => "yield",
    }
}

impl Keyword {
    /// Built-in type keywords (`int`, `string`, ...)
    pub fn is_predefined_type(self) -> bool {
        matches!(
            self,
            Keyword::Bool
                | Keyword::Byte
                | Keyword::Char
                | Keyword::Decimal
                | Keyword::Double
                | Keyword::Float
                | Keyword::Int
                | Keyword::Long
                | Keyword::Object
                | Keyword::Sbyte
                | Keyword::Short
                | Keyword::String
                | Keyword::Uint
                | Keyword::Ulong
                | Keyword::Ushort
                | Keyword::Void
        )
    }

    /// Declaration modifiers that may precede a member or type
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Keyword::Abstract
                | Keyword::Const
                | Keyword::Extern
                | Keyword::Fixed
                | Keyword::Internal
                | Keyword::New
                | Keyword::Override
                | Keyword::Private
                | Keyword::Protected
                | Keyword::Public
                | Keyword::Readonly
                | Keyword::Sealed
                | Keyword::Static
                | Keyword::Unsafe
                | Keyword::Virtual
                | Keyword::Volatile
                | Keyword::Ref
        )
    }

    /// Attribute target specifiers (`[return: X]`)
    pub fn is_attribute_target(self) -> bool {
        matches!(
            self,
            Keyword::Assembly
                | Keyword::Module
                | Keyword::Field
                | Keyword::Event
                | Keyword::Method
                | Keyword::Param
                | Keyword::Property
                | Keyword::Return
                | Keyword::Type
                | Keyword::Typevar
        )
    }

    /// Fully qualified framework name of a predefined type keyword
    pub fn predefined_type_name(self) -> Option<&'static str> {
        Some(match self {
            Keyword::Bool => "System.Boolean",
            Keyword::Byte => "System.Byte",
            Keyword::Char => "System.Char",
            Keyword::Decimal => "System.Decimal",
            Keyword::Double => "System.Double",
            Keyword::Float => "System.Single",
            Keyword::Int => "System.Int32",
            Keyword::Long => "System.Int64",
            Keyword::Object => "System.Object",
            Keyword::Sbyte => "System.SByte",
            Keyword::Short => "System.Int16",
            Keyword::String => "System.String",
            Keyword::Uint => "System.UInt32",
            Keyword::Ulong => "System.UInt64",
            Keyword::Ushort => "System.UInt16",
            _ => return None,
        })
    }
}

/// Whether `text` is a reserved keyword (and so needs `@` to be a name)
pub fn is_reserved_keyword(text: &str) -> bool {
    reserved_keyword(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_lookup() {
        assert_eq!(reserved_keyword("class"), Some(Keyword::Class));
        assert_eq!(reserved_keyword("var"), None);
        assert!(is_reserved_keyword("stackalloc"));
    }

    #[test]
    fn test_contextual_lookup() {
        assert_eq!(contextual_keyword("var"), Some(Keyword::Var));
        assert_eq!(contextual_keyword("orderby"), Some(Keyword::Orderby));
        assert!(Keyword::Var.is_contextual());
        assert!(!Keyword::Class.is_contextual());
    }

    #[test]
    fn test_spellings_round_trip() {
        for keyword in RESERVED_KEYWORDS {
            assert_eq!(reserved_keyword(keyword.as_str()), Some(*keyword));
        }
        for keyword in CONTEXTUAL_KEYWORDS {
            assert_eq!(contextual_keyword(keyword.as_str()), Some(*keyword));
        }
    }

    #[test]
    fn test_predefined_types() {
        assert!(Keyword::Int.is_predefined_type());
        assert_eq!(Keyword::String.predefined_type_name(), Some("System.String"));
        assert!(!Keyword::Class.is_predefined_type());
    }
}
