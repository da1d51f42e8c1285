//! Classes become class expressions with a warning constructor.

use super::interface::inherited;
use super::{member_access, object_key, warn_statement, Emitter, Placement, Synth};
use crate::entity::{ClassEntity, Declaration, HeritageEntity, HeritageKind, MethodEntity};
use crate::naming::upper_first;
use crate::warning::WarningKind;
use indexmap::IndexSet;

impl<'a> Synth<'a> {
    pub(super) fn class(
        &mut self,
        out: &mut Emitter,
        class: &'a ClassEntity,
        scope: &'a [Declaration],
        placement: Placement,
    ) {
        let name = upper_first(&class.name);
        let base = class.base().and_then(|base| self.class_base(&name, base));
        let keyword = placement.keyword();
        match &base {
            Some(base) => out.open(&format!("{keyword} {name} = class {name} extends {base} {{")),
            None => out.open(&format!("{keyword} {name} = class {name} {{")),
        }

        let own: IndexSet<String> = class
            .properties
            .iter()
            .map(|p| p.name.lookup())
            .chain(class.methods.keys().cloned())
            .collect();
        let implemented: Vec<HeritageEntity> = class
            .heritage
            .iter()
            .filter(|h| h.kind == HeritageKind::Implements || base.is_none())
            .cloned()
            .collect();
        let extra = inherited(&implemented, own, scope);

        out.open("constructor(...args) {");
        if base.is_some() {
            out.line("super();");
        }
        out.line(&warn_statement(&name, "constructor"));
        for prop in class.properties.iter().chain(extra.properties) {
            let value = self.property_value(&name, prop);
            out.line(&format!("{} = {value};", member_access("this", &prop.name)));
        }
        out.close("}");

        let methods: Vec<(&str, &[MethodEntity])> = class
            .methods
            .iter()
            .map(|(key, overloads)| (key.as_str(), overloads.as_slice()))
            .chain(extra.methods)
            .collect();
        for (key, overloads) in methods {
            out.blank();
            out.open(&format!("{}(...args) {{", object_key(&overloads[0].name)));
            self.stub_body(out, &name, key, overloads);
            out.close("}");
        }
        out.close("};");

        for (key, overloads) in &class.static_methods {
            let target = member_access(&name, &overloads[0].name);
            out.open(&format!("{target} = function (...args) {{"));
            self.stub_body(out, &name, key, overloads);
            out.close("};");
        }
        for prop in &class.static_properties {
            let value = self.property_value(&name, prop);
            out.line(&format!("{} = {value};", member_access(&name, &prop.name)));
        }
        if class.modifiers.default {
            out.line(&format!("export default {name};"));
        }
    }

    /// The `extends` target as an expression, or `None` when the base is not
    /// a class the generated code can reach.
    fn class_base(&mut self, name: &str, base: &HeritageEntity) -> Option<String> {
        if base.name == "Array" {
            return Some("Array".to_string());
        }
        let snapshot = self.corpus.snapshot;
        let known = match base.name.rsplit_once('.') {
            Some((_, last)) => snapshot.is_class(last) || snapshot.is_class(&upper_first(last)),
            None => snapshot.is_class(&base.name),
        };
        if known {
            if let Some(target) = self.imports.resolve_binding(&base.name) {
                return Some(target);
            }
        } else if !base.name.contains('.') && snapshot.is_class(&upper_first(&base.name)) {
            return Some(upper_first(&base.name));
        }
        self.warn(
            WarningKind::Simplified,
            format!("{name} extends `{}`, which is not a known class; dropping the base", base.raw),
        );
        None
    }
}

/// `body` with every class moved behind the same-scope classes it extends.
///
/// Only classes swap places; every other declaration keeps its slot.
pub(super) fn bases_first(body: &[Declaration]) -> Vec<&Declaration> {
    let slots: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, decl)| matches!(decl, Declaration::Class(_)))
        .map(|(index, _)| index)
        .collect();
    let class_at = |k: usize| match &body[slots[k]] {
        Declaration::Class(class) => Some(class),
        _ => None,
    };
    let local_base = |k: usize| {
        let base = class_at(k)?.base()?;
        (0..slots.len()).find(|&other| {
            class_at(other).is_some_and(|c| c.name == base.name || upper_first(&c.name) == base.name)
        })
    };

    let mut placed: IndexSet<usize> = IndexSet::new();
    for start in 0..slots.len() {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(base) = local_base(current) {
            if placed.contains(&base) || chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = base;
        }
        for k in chain.into_iter().rev() {
            placed.insert(k);
        }
    }

    let mut sorted = placed.into_iter().map(|k| &body[slots[k]]);
    body.iter()
        .map(|decl| match decl {
            Declaration::Class(_) => sorted.next().unwrap_or(decl),
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::tests::generate;
    use crate::warning::WarningKind;

    #[test]
    fn test_class_extends_known_class() {
        let src = "export class A { x: number; }\nexport class B extends A { y: string; run(): void; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        let expected = "\
export const B = class B extends A {
    constructor(...args) {
        super();
        console.warn('The B.constructor interface in the Previewer is a mocked implementation and may behave differently than on a real device.');
        this.y = '[PC Preview] unknown y';
    }

    run(...args) {
        console.warn('The B.run interface in the Previewer is a mocked implementation and may behave differently than on a real device.');
    }
};
";
        assert!(output.code.ends_with(expected), "{}", output.code);
    }

    #[test]
    fn test_unknown_base_is_dropped() {
        let src = "export class B extends Missing {}\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert!(output.code.starts_with("export const B = class B {\n"));
        assert!(!output.code.contains("super();"));
        assert_eq!(output.warnings[0].kind, WarningKind::Simplified);
    }

    #[test]
    fn test_statics_are_assigned_after_class() {
        let src = "export class Clock {\n  static now(): number;\n  static readonly ZERO: number;\n}\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert!(output.code.contains("};\nClock.now = function (...args) {\n"));
        assert!(output.code.contains("    return 0;\n};\nClock.ZERO = 0;\n"));
    }

    #[test]
    fn test_implemented_interface_members() {
        let src = "interface Closable { close(): void; }\n\
                   export class Stream implements Closable { read(): string; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        let class = output.code.split("export const Stream").nth(1).unwrap_or_default();
        assert!(class.contains("    read(...args) {"));
        assert!(class.contains("    close(...args) {"));
    }

    #[test]
    fn test_lowercase_class_name_is_capitalized() {
        let src = "export class connection { port: number; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert!(output.code.starts_with("export const Connection = class Connection {"));
        assert!(output.code.contains("this.port = 0;"));
    }

    #[test]
    fn test_base_is_emitted_before_subclass() {
        let src = "export class C extends B {}\nexport class B extends A {}\nexport class A {}\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        let at = |needle: &str| output.code.find(needle).unwrap_or(usize::MAX);
        assert!(at("export const A = class A {") < at("export const B = class B extends A {"));
        assert!(at("export const B = class B extends A {") < at("export const C = class C extends B {"));
    }

    #[test]
    fn test_base_is_emitted_first_inside_a_module() {
        let src = "declare namespace shapes {\n  class Square extends Shape {}\n  class Shape {}\n}\nexport default shapes;\n";
        let output = generate(&[("api/@ohos.shapes.d.ts", src)], "api/@ohos.shapes.d.ts");
        let shape = output.code.find("const Shape = class Shape {").unwrap();
        let square = output.code.find("const Square = class Square extends Shape {").unwrap();
        assert!(shape < square, "{}", output.code);
    }

    #[test]
    fn test_inheritance_cycle_keeps_every_class() {
        let src = "export class A extends B {}\nexport class B extends A {}\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert_eq!(output.code.matches("export const A = class A").count(), 1);
        assert_eq!(output.code.matches("export const B = class B").count(), 1);
    }
}
