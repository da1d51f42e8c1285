//! End-to-end runs of the pipeline over in-memory declaration corpora.

use dtsmock_core::{MemorySource, MockConfig, Pipeline, PipelineOutput, WarningKind};
use std::path::PathBuf;

fn run(source: MemorySource, inputs: &[&str]) -> PipelineOutput {
    let inputs: Vec<PathBuf> = inputs.iter().map(PathBuf::from).collect();
    Pipeline::new(source, MockConfig::default()).run(&inputs)
}

fn code_of<'o>(output: &'o PipelineOutput, source: &str) -> &'o str {
    output
        .files
        .iter()
        .find(|f| f.source == PathBuf::from(source))
        .map(|f| f.code.as_str())
        .unwrap_or_else(|| panic!("{source} was not generated"))
}

#[test]
fn test_primitive_properties() {
    let source = MemorySource::new().with(
        "prims.d.ts",
        "export interface Prims { s: string; n: number; b: boolean; }\n",
    );
    let output = run(source, &["prims.d.ts"]);
    let code = code_of(&output, "prims.d.ts");
    assert!(code.contains("s: '[PC Preview] unknown s',"));
    assert!(code.contains("n: 0,"));
    assert!(code.contains("b: true,"));
}

#[test]
fn test_union_picks_first_literal_regardless_of_rest() {
    for union in ["'a' | 'b' | 3", "'a' | 3 | 'b'"] {
        let src = format!("export interface U {{ mode: {union}; }}\n");
        let output = run(MemorySource::new().with("u.d.ts", src), &["u.d.ts"]);
        assert!(code_of(&output, "u.d.ts").contains("mode: \"a\","), "{union}");
    }
}

#[test]
fn test_iterable_iterator_yields_one_value() {
    let source = MemorySource::new().with(
        "iter.d.ts",
        "export interface Bag { values(): IterableIterator<string>; }\n",
    );
    let output = run(source, &["iter.d.ts"]);
    let code = code_of(&output, "iter.d.ts");
    assert!(code.contains("if (index < 1) {"));
    assert!(code.contains("return { value: '[PC Preview] unknown type', done: false };"));
    assert!(code.contains("return { done: true };"));
    assert_eq!(code.matches("done: false").count(), 1);
}

#[test]
fn test_interface_literal_shape() {
    let source = MemorySource::new().with(
        "foo.d.ts",
        "export interface Foo { bar: string; baz(): number; }\n",
    );
    let output = run(source, &["foo.d.ts"]);
    let expected = "\
export const Foo = {
    bar: '[PC Preview] unknown bar',
    baz: function (...args) {
        console.warn('The Foo.baz interface in the Previewer is a mocked implementation and may behave differently than on a real device.');
        return 0;
    },
};
";
    assert_eq!(code_of(&output, "foo.d.ts"), expected);
}

#[test]
fn test_subclass_inherits_through_real_chain() {
    let source = MemorySource::new()
        .with("a.d.ts", "export class A { m(): void; }\n")
        .with("b.d.ts", "import { A } from './a';\nexport class B extends A { n(): number; }\n");
    let output = run(source, &["a.d.ts", "b.d.ts"]);
    assert!(code_of(&output, "a.d.ts").contains("    m(...args) {"));
    let b = code_of(&output, "b.d.ts");
    assert!(b.starts_with("import { A } from './a';\n\n"));
    assert!(b.contains("export const B = class B extends A {"));
    assert!(b.contains("        super();"));
    assert!(!b.contains("m(...args)"));
}

#[test]
fn test_class_from_later_input_is_constructed() {
    let source = MemorySource::new()
        .with("a.d.ts", "export interface X { w: Widget; }\n")
        .with("b.d.ts", "export class Widget {}\n");
    let output = run(source, &["a.d.ts", "b.d.ts"]);
    assert!(code_of(&output, "a.d.ts").contains("    w: new Widget(),\n"));
    assert!(code_of(&output, "b.d.ts").contains("export const Widget = class Widget {"));
}

#[test]
fn test_shared_import_emitted_once() {
    let source = MemorySource::new()
        .with(
            "@internal/component/ets/common.d.ts",
            "declare interface ResourceColor { r: number; }\n",
        )
        .with(
            "widget.d.ts",
            "export interface Widget { fg: ResourceColor; bg: ResourceColor; }\n\
             export function paint(color: ResourceColor): ResourceColor;\n",
        );
    let output = run(source, &["widget.d.ts"]);
    let code = code_of(&output, "widget.d.ts");
    let import = "import { ResourceColor } from './@internal/component/ets/common';";
    assert_eq!(code.matches(import).count(), 1);
    assert!(code.contains("fg: ResourceColor,"));
    assert!(output
        .files
        .iter()
        .any(|f| f.source == PathBuf::from("@internal/component/ets/common.d.ts")));
}

#[test]
fn test_colliding_factories_get_distinct_names() {
    let source = MemorySource::new()
        .with(
            "@ohos.foo.d.ts",
            "declare namespace foo { function a(): void; }\nexport default foo;\n",
        )
        .with(
            "@ohos.net.foo.d.ts",
            "declare namespace foo { function b(): void; }\nexport default foo;\n",
        );
    let output = run(source, &["@ohos.foo.d.ts", "@ohos.net.foo.d.ts"]);
    let bindings: Vec<&str> = output.napi_entries.iter().map(|e| e.binding.as_str()).collect();
    let labels: Vec<&str> = output.napi_entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(bindings, vec!["mockFoo", "ohosNetFoo"]);
    assert_eq!(labels, vec!["foo", "net.foo"]);
    assert!(output
        .napi_index
        .contains("import { mockFoo as ohosNetFoo } from './ohos_net_foo';"));
    assert!(output.napi_index.contains("            case 'net.foo':\n                return ohosNetFoo();"));
}

#[test]
fn test_system_files_fill_the_plugin_table() {
    let source = MemorySource::new().with(
        "@system.vibrator.d.ts",
        "export default class Vibrator {\n  static vibrate(options?: object): void;\n}\n",
    );
    let output = run(source, &["@system.vibrator.d.ts"]);
    let file = &output.files[0];
    assert!(file.is_system);
    assert_eq!(file.output, PathBuf::from("system_vibrator.js"));
    assert_eq!(output.system_entries.len(), 1);
    assert!(output.system_index.contains("import { mockVibrator } from './system_vibrator';"));
    assert!(output.system_index.contains("    mockVibrator();\n"));
    assert!(output.napi_entries.is_empty());
}

#[test]
fn test_runs_are_deterministic() {
    let corpus = || {
        MemorySource::new()
            .with("@internal/component/ets/common.d.ts", "declare class Resource {}\n")
            .with(
                "@ohos.display.d.ts",
                "declare namespace display {\n  interface Display { id: number; icon: Resource; }\n  function get(): Display;\n}\nexport default display;\n",
            )
    };
    let first = run(corpus(), &["@ohos.display.d.ts"]);
    let second = run(corpus(), &["@ohos.display.d.ts"]);
    assert_eq!(first.files, second.files);
    assert_eq!(first.napi_index, second.napi_index);
}

#[test]
fn test_unresolved_reference_is_reported_not_fatal() {
    let source = MemorySource::new().with(
        "a.d.ts",
        "export interface A { other: Unknowable; }\n",
    );
    let output = run(source, &["a.d.ts"]);
    assert!(output.failures.is_empty());
    let file = &output.files[0];
    assert!(file.code.contains("other: Unknowable,"));
    assert!(file.warnings.iter().any(|w| w.kind == WarningKind::Unresolved));
}

#[test]
fn test_registration_tables() {
    let source = MemorySource::new().with(
        "@ohos.util.d.ts",
        "export function format(s: string): string;\n",
    );
    let output = run(source, &["@ohos.util.d.ts"]);
    assert!(code_of(&output, "@ohos.util.d.ts").contains("export function mockUtil() {"));
    assert_eq!(output.napi_entries[0].factory, "mockUtil");
    assert_eq!(output.napi_entries[0].label, "util");
    assert!(output.system_entries.iter().all(|e| e.factory != "mockUtil"));
}
