use pretty_assertions::assert_eq;
use quill_core::TextRange;
use quill_rename::{rename, rewrite, ModelSemantics, RenameLocation, RenameParams, RenameSession};
use quill_resolve::SemanticModel;

fn offset(src: &str, pattern: &str) -> u32 {
    src.find(pattern).expect("pattern missing from fixture") as u32
}

#[test]
fn verbatim_identifiers_lose_the_escape_when_the_new_name_allows_it() {
    let src = "\
class App
{
    void Run()
    {
        int @total = 1;
        @total = @total + 1;
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "@total"), "sum"))
        .expect("rename should succeed");

    assert!(outcome.text.contains("int sum = 1;"));
    assert!(outcome.text.contains("sum = sum + 1;"));
}

#[test]
fn renaming_onto_a_keyword_keeps_the_escape() {
    let src = "\
class App
{
    void Run()
    {
        int value = 1;
        value = value + 1;
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "value"), "@int"))
        .expect("rename should succeed");

    assert!(outcome.text.contains("int @int = 1;"));
    assert!(outcome.text.contains("@int = @int + 1;"));
}

#[test]
fn attribute_short_form_is_preserved_across_the_rename() {
    let src = "\
class FooAttribute
{
}

[Foo]
class Target
{
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "FooAttribute"), "BarAttribute"))
        .expect("rename should succeed");

    assert!(outcome.text.contains("class BarAttribute"));
    assert!(
        outcome.text.contains("[Bar]"),
        "the short attribute reference keeps its short form; got:\n{}",
        outcome.text
    );
}

#[test]
fn nameof_arguments_are_renamed_and_marked_as_member_group_references() {
    let src = "\
class App
{
    void Run() { }

    string Name()
    {
        return nameof(Run);
    }
}
";
    let outcome = rename(src, &RenameParams::new(offset(src, "Run()"), "Go"))
        .expect("rename should succeed");

    assert!(outcome.text.contains("nameof(Go)"));
    assert!(
        outcome
            .annotations
            .iter()
            .any(|(_, a)| a.is_member_group_reference),
        "the nameof argument should be marked as a member-group reference"
    );
}

#[test]
fn accessor_shaped_locations_keep_their_prefix() {
    let src = "\
class Widget
{
    int get_Foo() { return 1; }
}
";
    let model = SemanticModel::analyze(src);
    let start = offset(src, "get_Foo");
    let symbol = model
        .declaration_at(start)
        .expect("get_Foo should be declared");

    let mut location = RenameLocation::new(TextRange::at(start, "get_Foo".len() as u32));
    location.is_renamable_accessor = true;
    let session = RenameSession::new(&model, symbol, "Bar").with_location(location);
    let semantics = ModelSemantics::new(&model);

    let result = rewrite(&model, &session, &semantics).expect("rewrite should succeed");
    assert!(
        result.text.contains("int get_Bar()"),
        "the compiler-shaped accessor prefix survives the rename; got:\n{}",
        result.text
    );
    let annotation = result
        .annotations
        .annotations_at(start)
        .iter()
        .find(|a| a.is_rename_location)
        .expect("accessor token should be annotated");
    assert_eq!(annotation.prefix, "get_");
}

#[test]
fn seeded_string_locations_are_substituted_without_the_global_opt_in() {
    let src = "\
class App
{
    void Greet()
    {
        string banner = \"Greet starting\";
    }
}
";
    let model = SemanticModel::analyze(src);
    let symbol = model
        .declaration_at(offset(src, "Greet()"))
        .expect("Greet should be declared");

    let inner = offset(src, "Greet starting");
    let mut location = RenameLocation::new(TextRange::at(inner, "Greet".len() as u32));
    location.in_string_or_comment = true;
    let session = RenameSession::new(&model, symbol, "Welcome").with_location(location);
    let semantics = ModelSemantics::new(&model);

    let result = rewrite(&model, &session, &semantics).expect("rewrite should succeed");
    assert!(
        result.text.contains("\"Welcome starting\""),
        "a seeded string location substitutes even with strings off; got:\n{}",
        result.text
    );
}
