//! Interfaces become plain objects; call signatures make them callable.

use super::function::plain_key;
use super::{object_key, Emitter, Placement, Synth};
use crate::entity::{
    Declaration, HeritageEntity, IndexSignatureEntity, InterfaceEntity, MethodEntity, PropertyEntity,
};
use crate::resolve::ValueSite;
use indexmap::IndexSet;

/// Members contributed by heritage interfaces declared in the same scope.
#[derive(Debug, Default)]
pub(super) struct Inherited<'a> {
    pub properties: Vec<&'a PropertyEntity>,
    pub methods: Vec<(&'a str, &'a [MethodEntity])>,
    pub index_signatures: Vec<&'a IndexSignatureEntity>,
}

/// Collect members of every interface reachable through `heritage`, skipping
/// keys already in `seen`. Unknown names and cycles are ignored.
pub(super) fn inherited<'a>(
    heritage: &[HeritageEntity],
    mut seen: IndexSet<String>,
    scope: &'a [Declaration],
) -> Inherited<'a> {
    let mut found = Inherited::default();
    let mut queue: Vec<String> = heritage.iter().map(|h| h.name.clone()).collect();
    let mut visited = IndexSet::new();
    let mut next = 0;
    while next < queue.len() {
        let name = queue[next].clone();
        next += 1;
        if !visited.insert(name.clone()) {
            continue;
        }
        let iface = scope.iter().find_map(|d| match d {
            Declaration::Interface(i) if i.name == name => Some(i),
            _ => None,
        });
        let Some(iface) = iface else {
            continue;
        };
        for prop in &iface.properties {
            if seen.insert(prop.name.lookup()) {
                found.properties.push(prop);
            }
        }
        for (key, overloads) in &iface.methods {
            if seen.insert(key.clone()) {
                found.methods.push((key.as_str(), overloads.as_slice()));
            }
        }
        for sig in &iface.index_signatures {
            if seen.insert(sig.key.clone()) {
                found.index_signatures.push(sig);
            }
        }
        queue.extend(iface.heritage.iter().map(|h| h.name.clone()));
    }
    found
}

impl<'a> Synth<'a> {
    pub(super) fn interface(
        &mut self,
        out: &mut Emitter,
        iface: &'a InterfaceEntity,
        scope: &'a [Declaration],
        placement: Placement,
    ) {
        let name = iface.name.as_str();
        let own: IndexSet<String> = iface
            .properties
            .iter()
            .map(|p| p.name.lookup())
            .chain(iface.methods.keys().cloned())
            .chain(iface.index_signatures.iter().map(|s| s.key.clone()))
            .collect();
        let extra = inherited(&iface.heritage, own, scope);

        let callable = !iface.call_signatures.is_empty();
        if callable {
            out.open(&format!(
                "{} {name} = Object.assign(function (...args) {{",
                placement.keyword()
            ));
            self.stub_body(out, name, "call", &iface.call_signatures);
            out.reopen("}, {");
        } else {
            out.open(&format!("{} {name} = {{", placement.keyword()));
        }

        for prop in iface.properties.iter().chain(extra.properties) {
            let value = self.property_value(name, prop);
            out.line(&format!("{}: {value},", object_key(&prop.name)));
        }

        let methods = iface
            .methods
            .iter()
            .map(|(key, overloads)| (key.as_str(), overloads.as_slice()))
            .chain(extra.methods);
        for (key, overloads) in methods {
            out.open(&format!("{}: function (...args) {{", object_key(&overloads[0].name)));
            self.stub_body(out, name, key, overloads);
            out.close("},");
        }

        for sig in iface.index_signatures.iter().chain(extra.index_signatures) {
            let value = self
                .types
                .value(Some(&sig.ty), ValueSite::Property(&sig.key), &mut self.imports);
            out.line(&format!("{}: {value},", plain_key(&sig.key)));
        }

        out.close(if callable { "});" } else { "};" });
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::generate;

    #[test]
    fn test_interface_object() {
        let src = "export interface Foo { bar: string; baz(): number; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        let expected = "\
export const Foo = {
    bar: '[PC Preview] unknown bar',
    baz: function (...args) {
        console.warn('The Foo.baz interface in the Previewer is a mocked implementation and may behave differently than on a real device.');
        return 0;
    },
};
";
        assert_eq!(output.code, expected);
    }

    #[test]
    fn test_overloads_render_once() {
        let src = "export interface Emitter {\n  on(type: 'a', callback: Callback<string>): void;\n  on(type: 'b', callback: Callback<number>): void;\n}\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert_eq!(output.code.matches("on: function").count(), 1);
        assert!(output.code.contains("args[args.length - 1].call(this, '');"));
    }

    #[test]
    fn test_heritage_members_are_merged() {
        let src = "export interface Base { id: number; name: string; }\n\
                   export interface Derived extends Base { name: string; extra: boolean; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        let derived = output.code.split("export const Derived").nth(1).unwrap_or_default();
        assert!(derived.contains("id: 0,"));
        assert!(derived.contains("extra: true,"));
        assert_eq!(derived.matches("name:").count(), 1);
    }

    #[test]
    fn test_heritage_cycle_terminates() {
        let src = "export interface A extends B { a: number; }\n\
                   export interface B extends A { b: number; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert!(output.code.contains("b: 0,"));
    }

    #[test]
    fn test_call_signature_makes_interface_callable() {
        let src = "export interface Factory { (x: number): string; kind: number; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert!(output.code.starts_with("export const Factory = Object.assign(function (...args) {\n"));
        assert!(output.code.contains("    return '';\n}, {\n    kind: 0,\n});\n"));
    }

    #[test]
    fn test_index_signature_entry() {
        let src = "export interface Headers { [key: string]: string; }\n";
        let output = generate(&[("api/a.d.ts", src)], "api/a.d.ts");
        assert!(output.code.contains("    key: '[PC Preview] unknown key',"));
    }
}
