//! Built-in framework names
//!
//! The classifier has no metadata reader. A fixed table of common framework
//! namespaces and types lets names such as `Console`, `Math` or `Regex`
//! bind without one. Parameters that carry `[StringSyntax]` in the real
//! framework carry it here too, which drives regex and JSON detection for
//! arguments.

use super::table::{BaseRef, Symbol, SymbolId, SymbolKind, SymbolTable, TypeRef};
use crate::embedded::EmbeddedLanguage;

struct LibraryBuilder<'a> {
    table: &'a mut SymbolTable,
}

impl LibraryBuilder<'_> {
    fn namespace(&mut self, path: &str) -> SymbolId {
        self.table.ensure_namespace(path)
    }

    fn type_symbol(&mut self, container: SymbolId, name: &str, kind: SymbolKind, arity: usize) -> SymbolId {
        self.table
            .add_member(container, Symbol::new(name, kind).with_arity(arity))
    }

    fn static_class(&mut self, container: SymbolId, name: &str) -> SymbolId {
        let id = self.type_symbol(container, name, SymbolKind::Class, 0);
        self.table.get_mut(id).is_static = true;
        id
    }

    fn base(&mut self, id: SymbolId, base: SymbolId) {
        self.table.get_mut(id).bases.push(BaseRef::Symbol(base));
    }

    fn member(&mut self, owner: SymbolId, name: &str, kind: SymbolKind, is_static: bool) -> SymbolId {
        self.table
            .add_member(owner, Symbol::new(name, kind).with_static(is_static))
    }

    fn typed_member(
        &mut self,
        owner: SymbolId,
        name: &str,
        kind: SymbolKind,
        is_static: bool,
        type_id: SymbolId,
    ) -> SymbolId {
        let id = self.member(owner, name, kind, is_static);
        self.table.get_mut(id).type_ref = TypeRef::Symbol(type_id);
        id
    }

    fn members(&mut self, owner: SymbolId, names: &[&str], kind: SymbolKind, is_static: bool) {
        for name in names {
            self.member(owner, name, kind, is_static);
        }
    }

    /// Method with named parameters; `syntax` marks parameters by index
    fn method(
        &mut self,
        owner: SymbolId,
        name: &str,
        kind: SymbolKind,
        is_static: bool,
        parameters: &[&str],
        syntax: &[(usize, EmbeddedLanguage)],
    ) -> SymbolId {
        let method = self.member(owner, name, kind, is_static);
        self.attach_parameters(method, parameters, syntax);
        method
    }

    fn constructor(&mut self, owner: SymbolId, parameters: &[&str], syntax: &[(usize, EmbeddedLanguage)]) {
        let name = self.table.get(owner).name.clone();
        let mut symbol = Symbol::new(name, SymbolKind::Method);
        symbol.container = Some(owner);
        let ctor = self.table.push(symbol);
        self.attach_parameters(ctor, parameters, syntax);
        self.table.get_mut(owner).constructors.push(ctor);
    }

    fn attach_parameters(&mut self, owner: SymbolId, parameters: &[&str], syntax: &[(usize, EmbeddedLanguage)]) {
        for (index, parameter) in parameters.iter().enumerate() {
            let mut symbol = Symbol::new(*parameter, SymbolKind::Parameter);
            symbol.container = Some(owner);
            symbol.string_syntax = syntax
                .iter()
                .find(|(position, _)| *position == index)
                .map(|(_, language)| *language);
            let id = self.table.push(symbol);
            self.table.get_mut(owner).parameters.push(id);
        }
    }
}

/// Populate `table` with the built-in framework names
pub fn install_library(table: &mut SymbolTable) {
    use EmbeddedLanguage::{Json, Regex};
    use SymbolKind::*;

    let mut lib = LibraryBuilder { table };

    // === System ===
    let system = lib.namespace("System");
    let object = lib.type_symbol(system, "Object", Class, 0);
    lib.members(object, &["ToString", "Equals", "GetHashCode", "GetType"], Method, false);
    lib.members(object, &["ReferenceEquals"], Method, true);

    let string = lib.type_symbol(system, "String", Class, 0);
    lib.member(string, "Empty", Field, true);
    lib.members(string, &["Format", "Join", "Concat", "IsNullOrEmpty", "IsNullOrWhiteSpace"], Method, true);
    lib.members(
        string,
        &["Substring", "Contains", "Replace", "Split", "Trim", "ToUpper", "ToLower", "StartsWith", "EndsWith", "IndexOf"],
        Method,
        false,
    );

    let int32 = lib.type_symbol(system, "Int32", Struct, 0);
    lib.members(int32, &["MaxValue", "MinValue"], Constant, true);
    lib.members(int32, &["Parse", "TryParse"], Method, true);
    lib.typed_member(string, "Length", Property, false, int32);

    let console = lib.static_class(system, "Console");
    lib.members(console, &["WriteLine", "Write", "ReadLine", "ReadKey", "Clear"], Method, true);
    lib.members(console, &["Out", "In", "Error"], Property, true);

    let math = lib.static_class(system, "Math");
    lib.members(math, &["Abs", "Max", "Min", "Sqrt", "Pow", "Round", "Floor", "Ceiling", "Sin", "Cos"], Method, true);
    lib.members(math, &["PI", "E"], Constant, true);

    let exception = lib.type_symbol(system, "Exception", Class, 0);
    lib.typed_member(exception, "Message", Property, false, string);
    lib.members(exception, &["StackTrace", "InnerException"], Property, false);
    lib.constructor(exception, &["message"], &[]);
    for name in ["ArgumentException", "ArgumentNullException", "InvalidOperationException", "NotImplementedException"] {
        let derived = lib.type_symbol(system, name, Class, 0);
        lib.base(derived, exception);
        lib.constructor(derived, &["message"], &[]);
    }

    let attribute = lib.type_symbol(system, "Attribute", Class, 0);
    let obsolete = lib.type_symbol(system, "ObsoleteAttribute", Class, 0);
    lib.base(obsolete, attribute);
    lib.constructor(obsolete, &["message", "error"], &[]);
    let attribute_usage = lib.type_symbol(system, "AttributeUsageAttribute", Class, 0);
    lib.base(attribute_usage, attribute);
    lib.members(attribute_usage, &["AllowMultiple", "Inherited"], Property, false);

    let date_time = lib.type_symbol(system, "DateTime", Struct, 0);
    lib.members(date_time, &["Now", "UtcNow", "Today"], Property, true);
    lib.members(date_time, &["Year", "Month", "Day"], Property, false);
    lib.members(date_time, &["AddDays", "AddHours", "ToString"], Method, false);
    lib.members(date_time, &["Parse"], Method, true);

    for arity in 0..=4 {
        lib.type_symbol(system, "Action", Delegate, arity);
    }
    for arity in 1..=5 {
        lib.type_symbol(system, "Func", Delegate, arity);
    }
    lib.type_symbol(system, "IDisposable", Interface, 0);
    lib.type_symbol(system, "Nullable", Struct, 1);

    // === System.Collections.Generic ===
    let generic = lib.namespace("System.Collections.Generic");
    let enumerable_interface = lib.type_symbol(generic, "IEnumerable", Interface, 1);
    lib.member(enumerable_interface, "GetEnumerator", Method, false);
    let list = lib.type_symbol(generic, "List", Class, 1);
    lib.base(list, enumerable_interface);
    lib.members(list, &["Add", "AddRange", "Remove", "Clear", "Contains", "Insert", "Sort", "IndexOf"], Method, false);
    lib.typed_member(list, "Count", Property, false, int32);
    let dictionary = lib.type_symbol(generic, "Dictionary", Class, 2);
    lib.base(dictionary, enumerable_interface);
    lib.members(dictionary, &["Add", "Remove", "TryGetValue", "ContainsKey", "Clear"], Method, false);
    lib.members(dictionary, &["Keys", "Values"], Property, false);
    lib.typed_member(dictionary, "Count", Property, false, int32);
    let hash_set = lib.type_symbol(generic, "HashSet", Class, 1);
    lib.base(hash_set, enumerable_interface);
    lib.members(hash_set, &["Add", "Remove", "Contains"], Method, false);
    for name in ["IList", "ICollection", "IDictionary", "IReadOnlyList"] {
        let arity = if name == "IDictionary" { 2 } else { 1 };
        let interface = lib.type_symbol(generic, name, Interface, arity);
        lib.base(interface, enumerable_interface);
    }
    let pair = lib.type_symbol(generic, "KeyValuePair", Struct, 2);
    lib.members(pair, &["Key", "Value"], Property, false);

    // === System.Linq ===
    let linq = lib.namespace("System.Linq");
    let enumerable = lib.static_class(linq, "Enumerable");
    for name in [
        "Where", "Select", "SelectMany", "First", "FirstOrDefault", "Last", "Single", "Any", "All",
        "Count", "ToList", "ToArray", "ToDictionary", "OrderBy", "OrderByDescending", "GroupBy",
        "Sum", "Max", "Min", "Distinct", "Skip", "Take",
    ] {
        lib.method(enumerable, name, ExtensionMethod, true, &["source"], &[]);
    }
    lib.members(enumerable, &["Range", "Repeat", "Empty"], Method, true);

    // === System.Threading.Tasks ===
    let tasks = lib.namespace("System.Threading.Tasks");
    let task = lib.type_symbol(tasks, "Task", Class, 0);
    lib.members(task, &["Run", "Delay", "FromResult", "WhenAll", "WhenAny"], Method, true);
    lib.member(task, "CompletedTask", Property, true);
    lib.members(task, &["Wait", "ContinueWith", "ConfigureAwait"], Method, false);
    let task_of = lib.type_symbol(tasks, "Task", Class, 1);
    lib.base(task_of, task);
    lib.member(task_of, "Result", Property, false);
    lib.type_symbol(tasks, "ValueTask", Struct, 0);

    // === System.Text ===
    let text = lib.namespace("System.Text");
    let builder = lib.type_symbol(text, "StringBuilder", Class, 0);
    lib.members(builder, &["Append", "AppendLine", "Insert", "Clear"], Method, false);
    lib.typed_member(builder, "Length", Property, false, int32);

    let regular_expressions = lib.namespace("System.Text.RegularExpressions");
    let regex_options = lib.type_symbol(regular_expressions, "RegexOptions", Enum, 0);
    lib.members(
        regex_options,
        &[
            "None", "IgnoreCase", "Multiline", "ExplicitCapture", "Compiled", "Singleline",
            "IgnorePatternWhitespace", "RightToLeft", "ECMAScript", "CultureInvariant", "NonBacktracking",
        ],
        EnumMember,
        false,
    );
    let regex = lib.type_symbol(regular_expressions, "Regex", Class, 0);
    lib.constructor(regex, &["pattern", "options"], &[(0, Regex)]);
    for name in ["IsMatch", "Match", "Matches", "Replace", "Split", "Count", "EnumerateMatches"] {
        lib.method(regex, name, Method, true, &["input", "pattern", "options"], &[(1, Regex)]);
    }
    lib.method(regex, "Escape", Method, true, &["str"], &[]);
    let match_type = lib.type_symbol(regular_expressions, "Match", Class, 0);
    lib.members(match_type, &["Success", "Value", "Groups", "Index", "Length"], Property, false);
    lib.member(match_type, "NextMatch", Method, false);

    let json = lib.namespace("System.Text.Json");
    let document = lib.type_symbol(json, "JsonDocument", Class, 0);
    lib.method(document, "Parse", Method, true, &["json", "options"], &[(0, Json)]);
    lib.member(document, "RootElement", Property, false);
    let serializer = lib.static_class(json, "JsonSerializer");
    lib.method(serializer, "Deserialize", Method, true, &["json", "options"], &[(0, Json)]);
    lib.member(serializer, "Serialize", Method, true);

    // === System.Diagnostics ===
    let diagnostics = lib.namespace("System.Diagnostics");
    let debug = lib.static_class(diagnostics, "Debug");
    lib.members(debug, &["Assert", "WriteLine", "Fail"], Method, true);

    let analysis = lib.namespace("System.Diagnostics.CodeAnalysis");
    let string_syntax = lib.type_symbol(analysis, "StringSyntaxAttribute", Class, 0);
    lib.base(string_syntax, attribute);
    lib.constructor(string_syntax, &["syntax", "arguments"], &[]);
    lib.members(
        string_syntax,
        &["Regex", "Json", "Xml", "Uri", "DateTimeFormat", "CompositeFormat", "NumericFormat"],
        Constant,
        true,
    );
    lib.member(string_syntax, "Syntax", Property, false);

    lib.namespace("System.IO");
    lib.namespace("System.Collections");
    lib.namespace("System.Threading");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> SymbolTable {
        let mut table = SymbolTable::new();
        install_library(&mut table);
        table
    }

    #[test]
    fn test_common_types_exist() {
        let table = library();
        let console = table.find_type("System.Console").expect("Console is built in");
        assert!(table.get(console).is_static);
        assert_eq!(table.get(console).kind, SymbolKind::Class);
        assert!(table.find_type("System.Text.RegularExpressions.Regex").is_some());
        assert!(table.find_type("System.Text.Json.JsonDocument").is_some());
        assert!(table
            .find_type("System.Diagnostics.CodeAnalysis.StringSyntaxAttribute")
            .is_some());
        assert!(table.find_namespace("System.Linq").is_some());
    }

    #[test]
    fn test_regex_parameters_carry_string_syntax() {
        let table = library();
        let regex = table.find_type("System.Text.RegularExpressions.Regex").unwrap();
        let constructor = table.get(regex).constructors[0];
        let pattern = table.get(constructor).parameters[0];
        assert_eq!(table.get(pattern).string_syntax, Some(EmbeddedLanguage::Regex));

        let is_match = table.members_named(regex, "IsMatch")[0];
        let parameters = &table.get(is_match).parameters;
        assert_eq!(table.get(parameters[0]).string_syntax, None);
        assert_eq!(table.get(parameters[1]).string_syntax, Some(EmbeddedLanguage::Regex));
    }

    #[test]
    fn test_generic_arities_are_separate_symbols() {
        let table = library();
        let system = table.find_namespace("System").unwrap();
        let arities: Vec<usize> = table
            .members_named(system, "Func")
            .iter()
            .map(|&id| table.get(id).arity)
            .collect();
        assert_eq!(arities, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_linq_methods_are_extensions() {
        let table = library();
        let enumerable = table.find_type("System.Linq.Enumerable").unwrap();
        let where_method = table.members_named(enumerable, "Where")[0];
        assert_eq!(table.get(where_method).kind, SymbolKind::ExtensionMethod);
    }
}
